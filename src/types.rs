use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback message when the backend reports a miss without its own text.
pub const NOT_FOUND_FALLBACK: &str = "CEP não encontrado";

/// Address record returned by a lookup. Every field is optional on the wire;
/// consumers fall back to the empty string for absent fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Body of a lookup response: `{ success, address?, error? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupResponse {
    pub fn found(address: Address) -> Self {
        Self {
            success: true,
            address: Some(address),
            error: None,
        }
    }
}

/// What a single lookup attempt amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Address),
    NotFound(String),
    TransportError,
}

impl LookupOutcome {
    /// Map a decoded response body to an outcome. A success body without an
    /// address still counts as found, with every field absent.
    pub fn from_response(response: LookupResponse) -> Self {
        if response.success {
            Self::Found(response.address.unwrap_or_default())
        } else {
            Self::NotFound(
                response
                    .error
                    .unwrap_or_else(|| NOT_FOUND_FALLBACK.to_string()),
            )
        }
    }
}

/// Visual class of the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Loading,
    /// Cleared baseline, before any interaction.
    #[default]
    Neutral,
}

impl StatusKind {
    /// Stable lowercase token for hosts that map kinds to styling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Loading => "loading",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
