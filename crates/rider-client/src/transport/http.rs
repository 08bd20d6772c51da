//! HTTP execution with `reqwest`.

use reqwest::multipart;
use rider_proto::{
    ApiFailure, Attachment, Body, Endpoint, Method, Part, failure::check_response,
};

use super::TransportError;
use crate::config::ClientConfig;

/// Executes [`Endpoint`]s against the REST backend.
///
/// Clone is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: String,
}

impl HttpExecutor {
    /// Build an executor for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the TLS backend cannot be set up.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.trim_end_matches('/').to_owned() })
    }

    /// Perform one call.
    ///
    /// Returns the body of a 2xx response. Anything else is classified into
    /// an [`ApiFailure`]: non-2xx statuses by [`check_response`], transport
    /// errors as network failures.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiFailure> {
        let method = match endpoint.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        };
        let mut request = self.http.request(method, endpoint.url(&self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let body =
            endpoint.body().map_err(|e| ApiFailure::decode(format!("invalid request: {e}")))?;
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Multipart(parts) => request.multipart(multipart_form(parts).await?),
        };

        tracing::debug!(endpoint = endpoint.name(), "sending request");
        let response = request.send().await.map_err(|e| ApiFailure::network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| ApiFailure::network(e.to_string()))?;
        tracing::debug!(endpoint = endpoint.name(), status, len = bytes.len(), "response");

        check_response(status, bytes.to_vec())
    }
}

async fn multipart_form(parts: Vec<Part>) -> Result<multipart::Form, ApiFailure> {
    let mut form = multipart::Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name, value),
            Part::File { name, attachment } => form.part(name, file_part(&attachment).await?),
        };
    }
    Ok(form)
}

async fn file_part(attachment: &Attachment) -> Result<multipart::Part, ApiFailure> {
    let path = local_path(&attachment.uri);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiFailure::network(format!("cannot read {path}: {e}")))?;
    multipart::Part::bytes(bytes)
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.mime)
        .map_err(|e| ApiFailure::decode(format!("invalid mime type {}: {e}", attachment.mime)))
}

/// Filesystem path of a local attachment URI.
fn local_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_uris_map_to_paths() {
        assert_eq!(local_path("file:///tmp/proof.jpg"), "/tmp/proof.jpg");
        assert_eq!(local_path("/tmp/proof.jpg"), "/tmp/proof.jpg");
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let executor = HttpExecutor::new(&ClientConfig::new("https://api.example.com/")).unwrap();
        assert_eq!(executor.base_url, "https://api.example.com");
    }

    #[tokio::test]
    async fn missing_attachment_is_a_network_failure() {
        let attachment = Attachment::jpeg("file:///nonexistent/rider/proof.jpg", "proof.jpeg");
        let failure = file_part(&attachment).await.unwrap_err();
        assert!(failure.is_transient());
        assert!(failure.message.contains("/nonexistent/rider/proof.jpg"));
    }
}
