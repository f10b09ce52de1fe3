use anyhow::{Context, Result};
use reqwest::Client;

use crate::cep::Cep;
use crate::types::LookupResponse;

/// Client for a CEP lookup endpoint speaking the
/// `{ success, address?, error? }` wire shape.
#[derive(Debug, Clone)]
pub struct CepClient {
    http: Client,
    base_url: String,
}

impl CepClient {
    /// `base_url` is the service root; the client appends `/lookup/{cep}`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Fetch the lookup response for one CEP.
    ///
    /// The body is decoded as JSON regardless of HTTP status: the wire
    /// contract carries failure in `success`, and misses arrive with a JSON
    /// body on a non-2xx status. Transport failures and non-JSON bodies are
    /// errors for the caller to surface.
    pub async fn lookup(&self, cep: &Cep) -> Result<LookupResponse> {
        let url = format!("{}/lookup/{}", self.base_url, cep.digits());
        tracing::debug!(%url, "issuing CEP lookup");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("lookup request for CEP {} failed", cep))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read lookup response body")?;

        tracing::debug!(%status, "lookup response received");

        serde_json::from_str(&body)
            .with_context(|| format!("lookup response for CEP {} was not valid JSON", cep))
    }
}
