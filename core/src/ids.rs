use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("compid is required")]
    MissingComponentId,
    #[error("compid must be an integer, got {0:?}")]
    InvalidComponentId(String),
    #[error("compid must be greater than or equal to 1, got {0}")]
    NonPositiveComponentId(i64),
    #[error("filetype is required")]
    MissingFileType,
    #[error("filetype must not be blank")]
    BlankFileType,
}

/// Numeric component identifier. Always `>= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ComponentId(i64);

impl ComponentId {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 1 {
            return Err(ValidationError::NonPositiveComponentId(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ComponentId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ComponentId> for i64 {
    fn from(value: ComponentId) -> Self {
        value.0
    }
}

impl FromStr for ComponentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingComponentId);
        }
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidComponentId(s.to_owned()))?;
        Self::new(value)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// File-type tag such as `readme` or `swagger`. Never empty or whitespace-only.
///
/// The tag is stored exactly as submitted; only the readme check in the
/// classifier compares case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileType(String);

impl FileType {
    pub const SWAGGER: &'static str = "swagger";

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::MissingFileType);
        }
        if value.trim().is_empty() {
            return Err(ValidationError::BlankFileType);
        }
        Ok(Self(value))
    }

    pub fn swagger() -> Self {
        Self(Self::SWAGGER.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileType> for String {
    fn from(value: FileType) -> Self {
        value.0
    }
}

impl AsRef<str> for FileType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for FileType {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a stored document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub component_id: ComponentId,
    pub file_type: FileType,
}

impl DocumentKey {
    pub fn new(component_id: ComponentId, file_type: FileType) -> Self {
        Self {
            component_id,
            file_type,
        }
    }

    /// Validates raw request values. `default_file_type` is used when the
    /// caller omitted `filetype` entirely.
    pub fn parse(
        component_id: Option<&str>,
        file_type: Option<&str>,
        default_file_type: Option<FileType>,
    ) -> Result<Self, ValidationError> {
        let component_id = component_id
            .ok_or(ValidationError::MissingComponentId)?
            .parse::<ComponentId>()?;

        let file_type = match (file_type, default_file_type) {
            (Some(raw), _) => FileType::new(raw)?,
            (None, Some(default)) => default,
            (None, None) => return Err(ValidationError::MissingFileType),
        };

        Ok(Self::new(component_id, file_type))
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component_id, self.file_type)
    }
}
