//! Capability discovery over the OCS API
//!
//! The push capability lives at `ocs.data.capabilities.notify_push` in the
//! server's capability document. Its absence is not an error: the server
//! simply does not offer push.

use crate::traits::{Credentials, PushCapabilities, PushError, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Path of the capability document, relative to the server root
pub const CAPABILITIES_PATH: &str = "/ocs/v2.php/cloud/capabilities?format=json";

const CAPABILITY_POINTER: &str = "/ocs/data/capabilities/notify_push";

/// Fetch the capability document and extract the push capability
///
/// # Errors
/// Transport failures and non-2xx answers are `PushError::Discovery`; a
/// `notify_push` object that does not have the expected shape is
/// `PushError::Parse`.
pub async fn discover_capabilities(
    http: &reqwest::Client,
    server_url: &str,
    credentials: Option<&Credentials>,
) -> Result<Option<PushCapabilities>> {
    let url = format!("{}{}", server_url.trim_end_matches('/'), CAPABILITIES_PATH);
    debug!("Fetching capabilities from {}", url);

    let mut request = http
        .get(&url)
        .header("OCS-APIRequest", "true")
        .header("Accept", "application/json");
    if let Some(credentials) = credentials {
        request = request.basic_auth(&credentials.username, Some(&credentials.password));
    }

    let response = request
        .send()
        .await
        .map_err(|e| PushError::Discovery(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PushError::Discovery(format!(
            "{} answered with HTTP {}",
            url, status
        )));
    }

    let document: Value = response
        .json()
        .await
        .map_err(|e| PushError::Discovery(format!("invalid capability document: {}", e)))?;

    let capabilities = parse_capabilities_document(&document)?;
    match &capabilities {
        Some(caps) => info!(
            "Server offers push at {} ({} type(s))",
            caps.endpoints.websocket,
            caps.types.len()
        ),
        None => info!("Server does not offer push"),
    }
    Ok(capabilities)
}

/// Extract the push capability from an OCS capability document
pub fn parse_capabilities_document(document: &Value) -> Result<Option<PushCapabilities>> {
    match document.pointer(CAPABILITY_POINTER) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| PushError::Parse(format!("malformed notify_push capability: {}", e))),
    }
}
