//! Boundary to the photo storage and recognition backend.
//!
//! Two JSON endpoints: `POST /salvar_foto` and `POST /reconhecer_foto`.

pub mod client;
pub mod types;

pub use client::{HttpBackend, PhotoBackend};
pub use types::RecognitionResponse;
