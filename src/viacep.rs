use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::cep::Cep;
use crate::types::Address;

const VIACEP_BASE_URL: &str = "https://viacep.com.br";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// ViaCEP flags an unassigned CEP with `"erro": true`, and some responses
/// carry it as the string `"true"` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ErrorFlag {
    Bool(bool),
    Text(String),
}

impl ErrorFlag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::Text(text) => text == "true",
        }
    }
}

/// Response body of `GET /ws/{cep}/json/`.
#[derive(Debug, Deserialize)]
struct ViaCepPayload {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    erro: Option<ErrorFlag>,
}

impl ViaCepPayload {
    fn is_miss(&self) -> bool {
        self.erro.as_ref().is_some_and(ErrorFlag::is_set)
    }

    fn into_address(self) -> Address {
        fn non_empty(value: String) -> Option<String> {
            if value.is_empty() { None } else { Some(value) }
        }

        Address {
            street: non_empty(self.logradouro),
            neighborhood: non_empty(self.bairro),
            city: non_empty(self.localidade),
            state: non_empty(self.uf),
        }
    }
}

/// Client for the public ViaCEP API.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(VIACEP_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a CEP. `Ok(None)` means the CEP is well-formed but not
    /// assigned to any address.
    pub async fn resolve(&self, cep: &Cep) -> Result<Option<Address>> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep.digits());
        tracing::debug!(%url, "querying ViaCEP");

        let payload: ViaCepPayload = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("ViaCEP request for CEP {} failed", cep))?
            .error_for_status()
            .context("ViaCEP rejected the request")?
            .json()
            .await
            .context("ViaCEP answered with an unexpected body")?;

        if payload.is_miss() {
            Ok(None)
        } else {
            Ok(Some(payload.into_address()))
        }
    }
}
