use std::sync::atomic::{AtomicU64, Ordering};

use crate::cep::{self, Cep};
use crate::client::CepClient;
use crate::fields::{FieldRole, FormBinding};
use crate::types::{Address, LookupOutcome, StatusKind};

pub const MSG_INVALID_CEP: &str = "Digite um CEP válido com 8 dígitos";
pub const MSG_SEARCHING: &str = "Buscando CEP...";
pub const MSG_FOUND: &str = "Endereço encontrado!";
pub const MSG_LOOKUP_FAILED: &str = "Erro ao buscar CEP. Tente novamente.";

/// Form widget that fills address fields from a CEP lookup.
///
/// The widget owns no fields itself; it works through the handles injected
/// via [`FormBinding`]. Every entry point is an event: changed input or an
/// explicit search request. Effects are writes to the bound fields, the
/// status line, and the focus slot.
pub struct CepWidget {
    client: CepClient,
    form: FormBinding,
    /// Sequence of the most recently issued lookup. A response is applied
    /// only while its lookup is still the latest, so an earlier lookup
    /// resolving late cannot clobber a newer one.
    issue: AtomicU64,
}

impl CepWidget {
    pub fn new(client: CepClient, form: FormBinding) -> Self {
        Self {
            client,
            form,
            issue: AtomicU64::new(0),
        }
    }

    pub fn form(&self) -> &FormBinding {
        &self.form
    }

    /// The postal-code field changed to `raw`.
    ///
    /// Rewrites the field in `XXXXX-XXX` display form and, once the input
    /// holds exactly 8 digits, runs the same search routine as the explicit
    /// trigger. More or fewer digits never start a lookup on their own.
    pub async fn on_input_changed(&self, raw: &str) {
        if self.form.field(FieldRole::PostalCode).is_none() {
            return;
        }

        let digits = cep::strip_non_digits(raw);
        self.form
            .set_field(FieldRole::PostalCode, cep::format_partial(raw));

        if digits.len() == 8 {
            self.on_search_requested().await;
        }
    }

    /// Explicit search trigger.
    ///
    /// Validates the current field value before anything touches the
    /// network; a value that does not strip to exactly 8 digits only
    /// renders the validation message.
    pub async fn on_search_requested(&self) {
        let Some(raw) = self.form.field_value(FieldRole::PostalCode) else {
            return;
        };

        match Cep::parse(&raw) {
            None => self.render_status(MSG_INVALID_CEP, StatusKind::Error),
            Some(code) => {
                self.render_status(MSG_SEARCHING, StatusKind::Loading);
                self.run_lookup(code).await;
            }
        }
    }

    async fn run_lookup(&self, code: Cep) {
        let seq = self.issue.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.client.lookup(&code).await;

        // A newer lookup was issued while this one was in flight; its
        // Loading state already owns the form. Drop everything.
        if self.issue.load(Ordering::SeqCst) != seq {
            tracing::debug!(cep = %code, "discarding stale lookup response");
            return;
        }

        let outcome = match result {
            Ok(response) => LookupOutcome::from_response(response),
            Err(err) => {
                tracing::error!("CEP lookup for {} failed: {:#}", code, err);
                LookupOutcome::TransportError
            }
        };
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&self, outcome: LookupOutcome) {
        match outcome {
            LookupOutcome::Found(address) => {
                self.apply_address(&address);
                self.render_status(MSG_FOUND, StatusKind::Success);
                self.form.focus(FieldRole::Number);
            }
            LookupOutcome::NotFound(message) => {
                self.render_status(&message, StatusKind::Error);
            }
            LookupOutcome::TransportError => {
                self.render_status(MSG_LOOKUP_FAILED, StatusKind::Error);
            }
        }
    }

    fn apply_address(&self, address: &Address) {
        let pairs = [
            (FieldRole::Street, &address.street),
            (FieldRole::Neighborhood, &address.neighborhood),
            (FieldRole::City, &address.city),
            (FieldRole::State, &address.state),
        ];
        for (role, value) in pairs {
            self.form.set_field(role, value.clone().unwrap_or_default());
        }
    }

    /// Write the status line. Rendering only; no other effects.
    fn render_status(&self, message: &str, kind: StatusKind) {
        self.form.status().set(message, kind);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use axum::{Json, Router, extract::Path, extract::State, routing::get};

    use super::*;
    use crate::types::{LookupResponse, NOT_FOUND_FALLBACK};

    #[derive(Clone, Default)]
    struct Recorder {
        hits: Arc<AtomicUsize>,
        last_cep: Arc<std::sync::Mutex<Option<String>>>,
    }

    async fn lookup_handler(
        State(recorder): State<Recorder>,
        Path(code): Path<String>,
    ) -> Json<LookupResponse> {
        recorder.hits.fetch_add(1, Ordering::SeqCst);
        *recorder.last_cep.lock().unwrap() = Some(code.clone());

        match code.as_str() {
            // Slow hit, for overlap tests.
            "11111111" => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(LookupResponse::found(Address {
                    street: Some("Rua Lenta".to_string()),
                    ..Default::default()
                }))
            }
            "99999999" => Json(LookupResponse {
                success: false,
                address: None,
                error: Some("CEP não encontrado".to_string()),
            }),
            "88888888" => Json(LookupResponse {
                success: false,
                address: None,
                error: None,
            }),
            _ => Json(LookupResponse::found(Address {
                street: Some("Rua A".to_string()),
                city: Some("X".to_string()),
                ..Default::default()
            })),
        }
    }

    async fn spawn_widget() -> (Arc<CepWidget>, Recorder) {
        let recorder = Recorder::default();
        let app = Router::new()
            .route("/lookup/:cep", get(lookup_handler))
            .with_state(recorder.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = CepClient::new(format!("http://{addr}")).unwrap();
        let widget = CepWidget::new(client, FormBinding::standard());
        (Arc::new(widget), recorder)
    }

    #[tokio::test]
    async fn test_eighth_digit_triggers_lookup_and_fills_fields() {
        let (widget, recorder) = spawn_widget().await;

        widget.on_input_changed("01310-100abc").await;

        assert_eq!(recorder.hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            recorder.last_cep.lock().unwrap().as_deref(),
            Some("01310100")
        );

        let form = widget.form();
        assert_eq!(
            form.field_value(FieldRole::PostalCode).as_deref(),
            Some("01310-100")
        );
        assert_eq!(form.field_value(FieldRole::Street).as_deref(), Some("Rua A"));
        assert_eq!(form.field_value(FieldRole::City).as_deref(), Some("X"));
        // absent sub-fields fall back to the empty string
        assert_eq!(form.field_value(FieldRole::Neighborhood).as_deref(), Some(""));
        assert_eq!(form.field_value(FieldRole::State).as_deref(), Some(""));

        assert_eq!(form.status().message(), MSG_FOUND);
        assert_eq!(form.status().kind(), StatusKind::Success);
        assert_eq!(form.focused(), Some(FieldRole::Number));
    }

    #[tokio::test]
    async fn test_short_and_long_input_never_auto_trigger() {
        let (widget, recorder) = spawn_widget().await;

        widget.on_input_changed("0131010").await;
        widget.on_input_changed("013101009").await;

        assert_eq!(recorder.hits.load(Ordering::SeqCst), 0);
        // nine digits format down to the first eight
        assert_eq!(
            widget.form().field_value(FieldRole::PostalCode).as_deref(),
            Some("01310-100")
        );
    }

    #[tokio::test]
    async fn test_explicit_search_rejects_short_input() {
        let (widget, recorder) = spawn_widget().await;

        widget.form().set_field(FieldRole::PostalCode, "123");
        widget.on_search_requested().await;

        assert_eq!(recorder.hits.load(Ordering::SeqCst), 0);
        assert_eq!(widget.form().status().message(), MSG_INVALID_CEP);
        assert_eq!(widget.form().status().kind(), StatusKind::Error);
    }

    #[tokio::test]
    async fn test_miss_keeps_fields_and_shows_server_message() {
        let (widget, _) = spawn_widget().await;
        widget.form().set_field(FieldRole::Street, "prefilled");

        widget.on_input_changed("99999-999").await;

        let form = widget.form();
        assert_eq!(form.status().message(), "CEP não encontrado");
        assert_eq!(form.status().kind(), StatusKind::Error);
        assert_eq!(form.field_value(FieldRole::Street).as_deref(), Some("prefilled"));
        assert_eq!(form.focused(), None);
    }

    #[tokio::test]
    async fn test_miss_without_message_uses_fallback() {
        let (widget, _) = spawn_widget().await;

        widget.on_input_changed("88888-888").await;

        assert_eq!(widget.form().status().message(), NOT_FOUND_FALLBACK);
        assert_eq!(widget.form().status().kind(), StatusKind::Error);
    }

    #[tokio::test]
    async fn test_transport_failure_is_contained() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = CepClient::new(format!("http://{addr}")).unwrap();
        let widget = CepWidget::new(client, FormBinding::standard());
        widget.form().set_field(FieldRole::City, "prefilled");

        widget.on_input_changed("01310100").await;

        let form = widget.form();
        assert_eq!(form.status().message(), MSG_LOOKUP_FAILED);
        assert_eq!(form.status().kind(), StatusKind::Error);
        assert_eq!(form.field_value(FieldRole::City).as_deref(), Some("prefilled"));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (widget, _) = spawn_widget().await;

        // First lookup answers slowly; a second one overtakes it.
        let slow = {
            let widget = widget.clone();
            tokio::spawn(async move {
                widget.run_lookup(Cep::parse("11111111").unwrap()).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        widget.run_lookup(Cep::parse("01310100").unwrap()).await;
        slow.await.unwrap();

        // The slow response resolved last but was issued first: discarded.
        let form = widget.form();
        assert_eq!(form.field_value(FieldRole::Street).as_deref(), Some("Rua A"));
        assert_eq!(form.status().message(), MSG_FOUND);
        assert_eq!(form.status().kind(), StatusKind::Success);
    }

    #[tokio::test]
    async fn test_unbound_postal_field_disables_both_triggers() {
        let client = CepClient::new("http://127.0.0.1:1").unwrap();
        let widget = CepWidget::new(client, FormBinding::new());

        widget.on_input_changed("01310100").await;
        widget.on_search_requested().await;

        assert_eq!(widget.form().status().message(), "");
        assert_eq!(widget.form().status().kind(), StatusKind::Neutral);
    }
}
