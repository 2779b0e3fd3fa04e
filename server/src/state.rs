use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use textfile_core::{Database, TextFileStore, config::AppConfig};

use crate::{
    auth::{HttpUserValidator, UserValidatorRef},
    textfile::service::TextFileService,
};

pub const SERVICE_NAME: &str = "ortelius-ms-textfile-crud";

#[derive(Clone)]
pub struct AppState {
    pub text_files: TextFileService,
    pub metadata: ServiceMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceMetadata {
    pub service_name: &'static str,
    pub version: &'static str,
}

impl Default for ServiceMetadata {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub fn build_state(database: &Database, config: &AppConfig) -> Result<AppState> {
    let store = TextFileStore::new(database, config);
    let validator: UserValidatorRef = Arc::new(HttpUserValidator::new(
        &config.validateuser_url,
        config.validateuser_timeout(),
    )?);
    Ok(build_state_with(store, validator))
}

pub fn build_state_with(store: TextFileStore, validator: UserValidatorRef) -> AppState {
    AppState {
        text_files: TextFileService::new(store, validator),
        metadata: ServiceMetadata::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_metadata_serializes_with_expected_fields() {
        let json = serde_json::to_value(ServiceMetadata::default()).expect("metadata serializes");
        assert_eq!(json["service_name"], "ortelius-ms-textfile-crud");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
