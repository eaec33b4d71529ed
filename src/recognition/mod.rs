//! Continuous recognition once enrollment is complete.

pub mod poller;

pub use poller::RecognitionPoller;
