use std::fmt;

use serde_json::Value as JsonValue;

const README_FILE_TYPE: &str = "readme";

/// Response content type chosen for a decoded text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Markdown,
    Json,
    Yaml,
    PlainText,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Markdown => "text/markdown",
            MediaType::Json => "application/json",
            MediaType::Yaml => "text/yaml",
            MediaType::PlainText => "text/plain",
        }
    }

    /// Value for a `Content-Type` header. Only `text/*` types carry a charset.
    pub fn content_type(self) -> String {
        let mime = self.as_str();
        if mime.starts_with("text/") {
            format!("{mime}; charset=utf-8")
        } else {
            mime.to_owned()
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the media type for a document. First match wins:
/// readme tag, then JSON, then YAML, then plain text.
///
/// JSON must be tried before YAML because every JSON document is also YAML.
pub fn classify(file_type: &str, text: &str) -> MediaType {
    if file_type.eq_ignore_ascii_case(README_FILE_TYPE) {
        return MediaType::Markdown;
    }
    if try_parse_json(text).is_some() {
        return MediaType::Json;
    }
    if try_parse_yaml(text).is_some() {
        return MediaType::Yaml;
    }
    MediaType::PlainText
}

pub fn try_parse_json(text: &str) -> Option<JsonValue> {
    serde_json::from_str(text).ok()
}

pub fn try_parse_yaml(text: &str) -> Option<serde_yaml::Value> {
    serde_yaml::from_str(text).ok()
}
