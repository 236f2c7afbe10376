//! Reqwest-based client for the license authority.
//!
//! The blocking reqwest client is built on first use so that an
//! `HttpAuthority` may be constructed anywhere, including inside an async
//! runtime. Checks themselves must run off the async executor (the monitor
//! uses `spawn_blocking`).

use crate::client::LicenseAuthority;
use crate::config::TierlockConfig;
use crate::crypto::verify::{decode_public_key, verify_body_signature, SIGNATURE_HEADER};
use crate::protocol::models::{parse_check_response, CheckRequest, CheckResponse};
use crate::TierlockError;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Path of the license check call, relative to the configured endpoint.
pub const CHECK_PATH: &str = "/license/check";

/// HTTP license authority.
pub struct HttpAuthority {
    client: OnceCell<Client>,
    url: String,
    user_agent: String,
    timeout: Duration,
    public_key_hex: Option<&'static str>,
}

impl HttpAuthority {
    /// Create an authority client from config.
    pub fn new(config: &TierlockConfig) -> Result<Self, TierlockError> {
        if let Some(key) = config.public_key_hex {
            decode_public_key(key)?;
        }

        Ok(Self {
            client: OnceCell::new(),
            url: format!("{}{}", config.endpoint.trim_end_matches('/'), CHECK_PATH),
            user_agent: build_user_agent(config),
            timeout: config.request_timeout,
            public_key_hex: config.public_key_hex,
        })
    }

    /// Full URL of the check call.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client(&self) -> Result<&Client, TierlockError> {
        self.client.get_or_try_init(|| {
            Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| TierlockError::Transport(format!("Failed to create client: {}", e)))
        })
    }
}

impl LicenseAuthority for HttpAuthority {
    fn check(&self, client_id: &str, token: &str) -> Result<CheckResponse, TierlockError> {
        let response = self
            .client()?
            .post(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .json(&CheckRequest { client_id, token })
            .send()
            .map_err(|e| TierlockError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TierlockError::Transport(format!(
                "License authority returned HTTP {}",
                status.as_u16()
            )));
        }

        let signature = response
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .bytes()
            .map_err(|e| TierlockError::Transport(format!("Failed to read body: {}", e)))?;

        if let Some(key) = self.public_key_hex {
            verify_body_signature(signature.as_deref(), &body, key)?;
        }

        let parsed = parse_check_response(&body)?;
        debug!(valid = parsed.valid, "license authority answered");
        Ok(parsed)
    }
}

/// Build a User-Agent string from config.
///
/// Format: `<app>/tierlock-<version>`
pub fn build_user_agent(config: &TierlockConfig) -> String {
    format!("{}/tierlock-{}", config.app_name, env!("CARGO_PKG_VERSION"))
}
