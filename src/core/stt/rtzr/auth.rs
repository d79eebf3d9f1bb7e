//! RTZR credential exchange.
//!
//! The streaming endpoint takes a short-lived bearer token, obtained by
//! posting the client id and secret as a form to the authenticate endpoint.

use serde::Deserialize;
use tracing::{error, info};

use crate::core::stt::base::STTError;

#[derive(Debug, Deserialize)]
pub struct RtzrToken {
    pub access_token: String,
    /// Unix timestamp after which the token is rejected.
    #[serde(default)]
    pub expire_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RtzrAuthClient {
    client: reqwest::Client,
    url: String,
}

impl RtzrAuthClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Exchange client credentials for an access token.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<RtzrToken, STTError> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("client_id", client_id), ("client_secret", client_secret)])
            .send()
            .await
            .map_err(|e| STTError::NetworkError(format!("RTZR authenticate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("RTZR authentication rejected with {}: {}", status, body);
            return Err(STTError::AuthenticationFailed(format!(
                "status {status}: {body}"
            )));
        }

        let token: RtzrToken = response.json().await.map_err(|e| {
            STTError::AuthenticationFailed(format!("invalid authenticate response: {e}"))
        })?;
        if token.access_token.is_empty() {
            return Err(STTError::AuthenticationFailed(
                "authenticate response carried an empty token".to_string(),
            ));
        }

        info!("Obtained RTZR access token (expires at {:?})", token.expire_at);
        Ok(token)
    }
}
