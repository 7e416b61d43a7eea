//! Blocking HTTP helpers shared by the webhook and bot API backends.

use crate::error::{DeliveryError, KnockError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error};

/// Creates the client a backend keeps for all of its deliveries.
///
/// Requests have no timeout; a slow provider blocks the caller until it answers.
pub(crate) fn client() -> Result<Client, KnockError> {
    Client::builder().timeout(None).build().map_err(KnockError::HttpClient)
}

/// Sends the request and maps transport failures and non-2xx statuses to
/// [`DeliveryError`].
pub(crate) fn send(backend: &'static str, request: RequestBuilder) -> Result<Response, DeliveryError> {
    let response = request.send().map_err(|e| {
        error!(backend, error = %e, "HTTP request failed");
        DeliveryError::Http { backend, source: e }
    })?;

    let status = response.status();
    if status.is_success() {
        debug!(backend, %status, "Provider accepted the message");
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        error!(backend, %status, body = %body, "Provider rejected the message");
        Err(DeliveryError::Status {
            backend,
            status,
            body,
        })
    }
}

/// Posts `payload` as JSON to `url`.
pub(crate) fn post_json(
    client: &Client,
    backend: &'static str,
    url: &str,
    payload: &Value,
) -> Result<Response, DeliveryError> {
    send(backend, client.post(url).json(payload))
}

/// Reads a JSON response body, treating an empty or non-JSON body as `null`.
pub(crate) fn json_body(response: Response) -> Value {
    response
        .text()
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or(Value::Null)
}
