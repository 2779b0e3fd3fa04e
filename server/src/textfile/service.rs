use textfile_core::{DocumentKey, MediaType, StoreError, TextFileStore, codec, media_type};
use tracing::{info, warn};

use crate::{AppError, auth::UserValidatorRef};

/// A decoded document ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub text: String,
    pub media_type: MediaType,
}

/// Authorizes, then reads or replaces stored text files. Keys arrive
/// already validated; storage is never touched unless authorization passed.
#[derive(Clone)]
pub struct TextFileService {
    store: TextFileStore,
    validator: UserValidatorRef,
}

impl TextFileService {
    pub fn new(store: TextFileStore, validator: UserValidatorRef) -> Self {
        Self { store, validator }
    }

    pub async fn fetch_document(
        &self,
        key: &DocumentKey,
        cookies: Option<&str>,
    ) -> Result<TextDocument, AppError> {
        self.authorize(key, cookies).await?;

        let records = self.store.fetch(key).await?;
        let text = codec::decode(&records)?;
        let media_type = media_type::classify(key.file_type.as_str(), &text);

        Ok(TextDocument { text, media_type })
    }

    /// Returns the number of stored chunks.
    pub async fn replace_document(
        &self,
        key: &DocumentKey,
        chunks: Vec<String>,
        cookies: Option<&str>,
    ) -> Result<usize, AppError> {
        self.authorize(key, cookies).await?;

        let written = self.store.replace(key, chunks).await?;
        info!(%key, lines = written, "text file replaced");
        Ok(written)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    async fn authorize(&self, key: &DocumentKey, cookies: Option<&str>) -> Result<(), AppError> {
        self.validator.validate(cookies).await.map_err(|err| {
            warn!(%key, error = %err, "authorization rejected");
            AppError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubValidator, TestStore, spawn_stub_validator};
    use axum::http::StatusCode;
    use textfile_core::ids::{ComponentId, FileType};

    fn key(component_id: i64, file_type: &str) -> DocumentKey {
        DocumentKey::new(
            ComponentId::new(component_id).unwrap(),
            FileType::new(file_type).unwrap(),
        )
    }

    async fn service(status: StatusCode) -> (TestStore, StubValidator, TextFileService) {
        let store = TestStore::new().await;
        let stub = spawn_stub_validator(status).await;
        let service = TextFileService::new(store.store(), stub.validator());
        (store, stub, service)
    }

    #[tokio::test]
    async fn never_written_document_is_empty() {
        let (_store, _stub, service) = service(StatusCode::OK).await;
        let doc = service.fetch_document(&key(1, "readme"), None).await.unwrap();
        assert_eq!(doc.text, "");
        assert_eq!(doc.media_type, MediaType::Markdown);
    }

    #[tokio::test]
    async fn replace_then_fetch_classifies_content() {
        let (_store, _stub, service) = service(StatusCode::OK).await;
        let key = key(4, "swagger");

        // base64 of {"openapi":"3.0.0"} split across chunks
        let chunks = vec!["eyJvcGVu".to_string(), "YXBpIjoiMy4wLjAifQ==".to_string()];
        assert_eq!(service.replace_document(&key, chunks, None).await.unwrap(), 2);

        let doc = service.fetch_document(&key, None).await.unwrap();
        assert_eq!(doc.text, "{\"openapi\":\"3.0.0\"}");
        assert_eq!(doc.media_type, MediaType::Json);
    }

    #[tokio::test]
    async fn denied_caller_never_reaches_the_store() {
        let (store, stub, service) = service(StatusCode::FORBIDDEN).await;

        let err = service
            .fetch_document(&key(2, "readme"), Some("session=x"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = service
            .replace_document(&key(2, "readme"), vec!["YQ==".into()], None)
            .await
            .unwrap_err();
        assert_eq!(err.name(), "AUTHORIZATION_FAILED");

        assert_eq!(stub.hits(), 2);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn corrupted_rows_surface_as_decode_fault() {
        let (_store, _stub, service) = service(StatusCode::OK).await;
        let key = key(5, "notes");
        service
            .replace_document(&key, vec!["YWJ".into()], None)
            .await
            .unwrap();

        let err = service.fetch_document(&key, None).await.unwrap_err();
        assert_eq!(err.name(), "DOCUMENT_CORRUPTED");
    }
}
