use std::env;

use anyhow::Result;
use futures::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cep_lookup_rs::{CepClient, CepWidget, FieldRole, FormBinding, StatusKind};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000";
const CONCURRENT_LOOKUPS: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <ceps> [endpoint]", args[0]);
        eprintln!("  ceps: comma-separated (e.g., 01310-100,20040-020)");
        eprintln!("  endpoint: lookup service root (default: {DEFAULT_ENDPOINT},");
        eprintln!("            or the CEP_ENDPOINT environment variable)");
        eprintln!();
        eprintln!("Run the resolver service first: cargo run --bin server");
        std::process::exit(1);
    }

    // Parse comma-separated CEPs
    let ceps: Vec<String> = args[1]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if ceps.is_empty() {
        eprintln!("Error: No CEPs provided");
        std::process::exit(1);
    }

    let endpoint = args
        .get(2)
        .cloned()
        .or_else(|| env::var("CEP_ENDPOINT").ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let client = CepClient::new(&endpoint)?;

    println!("Looking up {} CEP(s) via {}...", ceps.len(), endpoint);

    let reports = futures::stream::iter(ceps.into_iter())
        .map(|raw| {
            let client = client.clone();
            async move { lookup_report(client, raw).await }
        })
        .buffer_unordered(CONCURRENT_LOOKUPS)
        .collect::<Vec<_>>()
        .await;

    for report in reports {
        println!("{report}");
    }

    Ok(())
}

/// Drive one widget through a full lookup and render the result.
///
/// Every CEP gets its own form; concurrent lookups are independent.
async fn lookup_report(client: CepClient, raw: String) -> String {
    let widget = CepWidget::new(client, FormBinding::standard());

    // Typing path first. Input that does not auto-trigger (not exactly 8
    // digits) goes through the explicit trigger, which surfaces the
    // validation message.
    widget.on_input_changed(&raw).await;
    if widget.form().status().kind() == StatusKind::Neutral {
        widget.on_search_requested().await;
    }

    let form = widget.form();
    let mut out = format!(
        "\nCEP: {}",
        form.field_value(FieldRole::PostalCode).unwrap_or_default()
    );
    out.push_str(&format!(
        "\n  [{}] {}",
        form.status().kind(),
        form.status().message()
    ));

    if form.status().kind() == StatusKind::Success {
        let fields = [
            ("Logradouro", FieldRole::Street),
            ("Bairro", FieldRole::Neighborhood),
            ("Cidade", FieldRole::City),
            ("UF", FieldRole::State),
        ];
        for (label, role) in fields {
            out.push_str(&format!(
                "\n  {}: {}",
                label,
                form.field_value(role).unwrap_or_default()
            ));
        }
    }

    out
}
