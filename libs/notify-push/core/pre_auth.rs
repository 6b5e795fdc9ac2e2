//! Pre-auth token exchange
//!
//! Before every connect attempt the client POSTs to the capability-reported
//! pre-auth endpoint. The response body is a one-shot token, sent verbatim
//! after an empty username frame.

use crate::traits::{AuthProvider, HeaderProvider, PendingAuth, PushError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Default auth provider: exchange the session for a one-shot token
#[derive(Clone)]
pub struct PreAuthExchange {
    http: reqwest::Client,
    headers: Option<Arc<dyn HeaderProvider>>,
}

impl PreAuthExchange {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            headers: None,
        }
    }

    /// Attach session headers (cookies, request tokens) to every POST
    pub fn with_headers(mut self, headers: Arc<dyn HeaderProvider>) -> Self {
        self.headers = Some(headers);
        self
    }
}

#[async_trait]
impl AuthProvider for PreAuthExchange {
    async fn pending_auth(&self, pre_auth_url: &str) -> Result<PendingAuth> {
        let mut request = self.http.post(pre_auth_url);
        if let Some(provider) = &self.headers {
            for (key, value) in provider.get_headers().await {
                request = request.header(key, value);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::PreAuth(format!("request to {} failed: {}", pre_auth_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::PreAuth(format!(
                "{} answered with HTTP {}",
                pre_auth_url, status
            )));
        }

        let token = response
            .text()
            .await
            .map_err(|e| PushError::PreAuth(format!("unreadable token body: {}", e)))?;

        if token.is_empty() {
            return Err(PushError::PreAuth("server returned an empty token".into()));
        }

        debug!("Obtained pre-auth token ({} bytes)", token.len());
        Ok(PendingAuth::Token(token))
    }
}
