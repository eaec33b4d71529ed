//! Request and response bodies of the storage/recognition endpoints.

use serde::{Deserialize, Serialize};

/// Status value the backend uses for a successful operation.
pub const STATUS_SUCCESS: &str = "sucesso";

/// Body of `POST /salvar_foto`.
#[derive(Debug, Serialize)]
pub struct SavePhotoRequest<'a> {
    /// JPEG data URL
    pub imagem: &'a str,
    /// Student name
    pub nome: &'a str,
}

/// Body of `POST /reconhecer_foto`.
#[derive(Debug, Serialize)]
pub struct RecognizeRequest<'a> {
    /// JPEG data URL
    pub imagem: &'a str,
}

/// Answer of `POST /salvar_foto`. Only logged; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SavePhotoResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mensagem: Option<String>,
}

impl SavePhotoResponse {
    /// A missing status is treated as accepted; only an explicit non-success
    /// status counts as a rejection.
    pub fn is_rejected(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status != STATUS_SUCCESS)
    }
}

/// Answer of `POST /reconhecer_foto`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecognitionResponse {
    pub status: String,
    /// Recognized student, present on success
    #[serde(default)]
    pub aluno: Option<String>,
    /// Match confidence (0-100) when the backend reports it
    #[serde(default)]
    pub confianca: Option<f64>,
    #[serde(default)]
    pub mensagem: Option<String>,
}

impl RecognitionResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_field_names() {
        let body = serde_json::to_value(SavePhotoRequest {
            imagem: "data:image/jpeg;base64,AA==",
            nome: "Ana Silva",
        })
        .unwrap();
        assert_eq!(body["imagem"], "data:image/jpeg;base64,AA==");
        assert_eq!(body["nome"], "Ana Silva");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_recognize_request_has_only_image() {
        let body = serde_json::to_value(RecognizeRequest { imagem: "x" }).unwrap();
        assert_eq!(body, serde_json::json!({ "imagem": "x" }));
    }

    #[test]
    fn test_save_response_accepts_any_shape() {
        let empty: SavePhotoResponse = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_rejected());

        let rejected: SavePhotoResponse = serde_json::from_str(
            r#"{"status":"erro","mensagem":"Nenhum rosto detectado!","extra":1}"#,
        )
        .unwrap();
        assert!(rejected.is_rejected());
        assert_eq!(rejected.mensagem.as_deref(), Some("Nenhum rosto detectado!"));
    }

    #[test]
    fn test_recognition_response_variants() {
        let hit: RecognitionResponse =
            serde_json::from_str(r#"{"status":"sucesso","aluno":"Ana","confianca":72}"#).unwrap();
        assert!(hit.is_success());
        assert_eq!(hit.aluno.as_deref(), Some("Ana"));
        assert_eq!(hit.confianca, Some(72.0));

        let miss: RecognitionResponse = serde_json::from_str(r#"{"status":"falha"}"#).unwrap();
        assert!(!miss.is_success());
        assert!(miss.aluno.is_none());
    }
}
