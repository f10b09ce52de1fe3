pub mod cep;
pub mod client;
pub mod fields;
pub mod types;
pub mod viacep;
pub mod widget;

pub use cep::Cep;
pub use client::CepClient;
pub use fields::{Field, FieldRole, FormBinding, StatusLine};
pub use types::{Address, LookupOutcome, LookupResponse, StatusKind};
pub use viacep::ViaCepClient;
pub use widget::CepWidget;
