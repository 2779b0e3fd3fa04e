// Request and response types for REST API handlers

use serde::{Deserialize, Serialize};
use textfile_core::{
    DocumentKey, ValidationError,
    ids::{ComponentId, FileType},
};

// ========== Request Types ==========

/// Raw query string; validated through `DocumentKey::parse`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextFileQuery {
    #[serde(default)]
    pub(crate) compid: Option<String>,
    #[serde(default)]
    pub(crate) filetype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplaceTextFileRequest {
    #[serde(default)]
    pub(crate) compid: Option<i64>,
    #[serde(default)]
    pub(crate) filetype: Option<String>,
    pub(crate) file: Vec<String>,
}

impl ReplaceTextFileRequest {
    pub(crate) fn into_parts(self) -> Result<(DocumentKey, Vec<String>), ValidationError> {
        let component_id =
            ComponentId::new(self.compid.ok_or(ValidationError::MissingComponentId)?)?;
        let file_type = FileType::new(self.filetype.ok_or(ValidationError::MissingFileType)?)?;
        Ok((DocumentKey::new(component_id, file_type), self.file))
    }
}

// ========== Response Types ==========

#[derive(Debug, Serialize)]
pub(crate) struct StatusMsg {
    pub(crate) status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) service_name: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub(crate) detail: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_request_requires_positive_compid_and_filetype() {
        let request: ReplaceTextFileRequest =
            serde_json::from_str(r#"{"compid": 0, "filetype": "readme", "file": []}"#).unwrap();
        assert_eq!(
            request.into_parts().unwrap_err(),
            ValidationError::NonPositiveComponentId(0)
        );

        let request: ReplaceTextFileRequest =
            serde_json::from_str(r#"{"compid": 3, "filetype": "  ", "file": []}"#).unwrap();
        assert_eq!(request.into_parts().unwrap_err(), ValidationError::BlankFileType);

        let request: ReplaceTextFileRequest =
            serde_json::from_str(r#"{"compid": 3, "file": ["YQ=="]}"#).unwrap();
        assert_eq!(request.into_parts().unwrap_err(), ValidationError::MissingFileType);
    }

    #[test]
    fn replace_request_keeps_chunks_in_order() {
        let request: ReplaceTextFileRequest = serde_json::from_str(
            r#"{"compid": 3, "filetype": "swagger", "file": ["b3Blbm", "FwaTog"]}"#,
        )
        .unwrap();
        let (key, chunks) = request.into_parts().unwrap();
        assert_eq!(key.to_string(), "3/swagger");
        assert_eq!(chunks, vec!["b3Blbm", "FwaTog"]);
    }

    #[test]
    fn down_status_omits_service_name() {
        let json = serde_json::to_value(StatusMsg {
            status: "DOWN",
            service_name: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": "DOWN" }));
    }
}
