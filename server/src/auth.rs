//! Delegated authorization against the user validation service.
//!
//! Every text file request is authorized by replaying the caller's cookies
//! to `GET {base}/msapi/validateuser`. Only a `200` admits the request.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{Client, header::COOKIE};
use thiserror::Error;
use tracing::debug;

const VALIDATE_USER_PATH: &str = "/msapi/validateuser";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validateuser responded with status {0}")]
    Denied(StatusCode),
    #[error("validateuser did not respond in time")]
    Timeout,
    #[error("validateuser request failed: {0}")]
    Unavailable(#[source] reqwest::Error),
}

#[async_trait]
pub trait UserValidator: Send + Sync {
    /// `cookies` is a ready-to-send `Cookie` header value, if the caller had any.
    async fn validate(&self, cookies: Option<&str>) -> Result<(), AuthError>;
}

pub type UserValidatorRef = Arc<dyn UserValidator>;

pub struct HttpUserValidator {
    client: Client,
    endpoint: String,
}

impl HttpUserValidator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("textfile-server/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("build validateuser http client")?;

        Ok(Self {
            client,
            endpoint: validate_user_endpoint(base_url),
        })
    }
}

#[async_trait]
impl UserValidator for HttpUserValidator {
    async fn validate(&self, cookies: Option<&str>) -> Result<(), AuthError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                AuthError::Timeout
            } else {
                AuthError::Unavailable(err)
            }
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "validateuser responded");
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(AuthError::Denied(status))
        }
    }
}

fn validate_user_endpoint(base_url: &str) -> String {
    format!("{}{VALIDATE_USER_PATH}", base_url.trim_end_matches('/'))
}
