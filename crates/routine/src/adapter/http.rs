//! Blocking HTTP calls shared by the HTTP-backed adapters.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` to avoid
//! blocking the async runtime. Non-2xx statuses surface as
//! `AdapterError::FetchFailed`.

use super::AdapterError;

/// GET `url` and parse the body as JSON.
pub(crate) async fn get_json(
    source_id: &str,
    url: String,
    auth_token: Option<String>,
) -> Result<serde_json::Value, AdapterError> {
    let sid = source_id.to_string();
    run_blocking(source_id, move || {
        let agent = ureq::Agent::new_with_defaults();
        let mut request = agent.get(&url);
        if let Some(ref token) = auth_token {
            request = request.header("Authorization", &format!("Bearer {}", token));
        }

        let response = request.call().map_err(|e| AdapterError::FetchFailed {
            source_id: sid.clone(),
            message: format!("GET {}: {}", url, e),
        })?;

        response
            .into_body()
            .read_json::<serde_json::Value>()
            .map_err(|e| AdapterError::InvalidResponse {
                source_id: sid,
                message: format!("failed to parse response as JSON: {}", e),
            })
    })
    .await
}

/// GET `url` and return the raw body bytes.
pub(crate) async fn get_bytes(source_id: &str, url: String) -> Result<Vec<u8>, AdapterError> {
    let sid = source_id.to_string();
    run_blocking(source_id, move || {
        let agent = ureq::Agent::new_with_defaults();
        let response = agent.get(&url).call().map_err(|e| AdapterError::FetchFailed {
            source_id: sid.clone(),
            message: format!("GET {}: {}", url, e),
        })?;

        response
            .into_body()
            .read_to_vec()
            .map_err(|e| AdapterError::FetchFailed {
                source_id: sid,
                message: format!("failed to read body of {}: {}", url, e),
            })
    })
    .await
}

/// POST `body` as JSON to `url`, discarding the response body.
pub(crate) async fn post_json(
    source_id: &str,
    url: String,
    auth_token: Option<String>,
    body: serde_json::Value,
) -> Result<(), AdapterError> {
    let sid = source_id.to_string();
    run_blocking(source_id, move || {
        let agent = ureq::Agent::new_with_defaults();
        let mut request = agent.post(&url);
        if let Some(ref token) = auth_token {
            request = request.header("Authorization", &format!("Bearer {}", token));
        }

        request
            .send_json(&body)
            .map(|_| ())
            .map_err(|e| AdapterError::FetchFailed {
                source_id: sid,
                message: format!("POST {}: {}", url, e),
            })
    })
    .await
}

async fn run_blocking<T, F>(source_id: &str, f: F) -> Result<T, AdapterError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AdapterError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AdapterError::FetchFailed {
            source_id: source_id.to_string(),
            message: format!("task join error: {}", e),
        })?
}
