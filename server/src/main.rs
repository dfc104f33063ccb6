mod compose;
mod routes;

use access_point::{fbr::FbrClient, mock::MockClient, InvoiceAuthorityClient};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use compose::BuyerEdits;
use config::{AppConfig, Mode, RelaySettings};
use fbr_einv_core::{models::Party, validation};
use relay::Relay;
use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fbr-einvoice-relay", version)]
#[command(about = "Relay for submitting test invoices to the FBR digital invoicing API", long_about = None)]
struct Cli {
    /// Runs the relay server when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a default token from stdin and store it in the OS keychain
    StoreToken {
        /// sandbox or production
        mode: Mode,
    },
    /// Write the effective configuration to the config file
    InitConfig,
    /// Fill a scenario template with seller/buyer details and print the payload
    Compose {
        /// Scenario template (a JSON invoice payload)
        template: PathBuf,
        #[arg(long)]
        seller_ntn_cnic: String,
        #[arg(long)]
        seller_business_name: String,
        #[arg(long, default_value = "")]
        seller_province: String,
        #[arg(long, default_value = "")]
        seller_address: String,
        #[arg(long)]
        buyer_ntn_cnic: Option<String>,
        #[arg(long)]
        buyer_business_name: Option<String>,
        #[arg(long)]
        buyer_province: Option<String>,
        #[arg(long)]
        buyer_address: Option<String>,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,warp=info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_invoice_client(
    cfg: &AppConfig,
    settings: &RelaySettings,
) -> anyhow::Result<Arc<dyn InvoiceAuthorityClient>> {
    match cfg.provider.kind.as_str() {
        "mock" => {
            tracing::info!("Using mock Invoice Authority API");
            Ok(MockClient::simulated(Duration::from_millis(200)))
        }
        _ => {
            if settings.endpoint.is_none() {
                tracing::warn!(
                    mode = %settings.mode,
                    "No upstream URL configured for active mode; submissions will fail"
                );
            }
            if settings.default_token.is_none() {
                tracing::warn!(
                    mode = %settings.mode,
                    "No default token configured; only requests with customToken will be sent"
                );
            }
            let timeout = cfg.relay.request_timeout_secs.map(Duration::from_secs);
            let client = FbrClient::new(settings.endpoint.clone(), timeout)
                .context("Failed to build HTTP client")?;
            Ok(client)
        }
    }
}

fn store_token(mode: Mode) -> anyhow::Result<()> {
    let mut token = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut token)
        .context("Failed to read token from stdin")?;
    let token = token.trim();
    if token.is_empty() {
        bail!("Empty token, nothing stored");
    }

    config::store_secret(mode.token_secret_key(), token)?;
    tracing::info!(%mode, "Default token stored in keychain");
    Ok(())
}

fn print_composed(path: PathBuf, seller: Party, buyer: BuyerEdits) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    let template: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Template {} is not JSON", path.display()))?;

    let payload = compose::compose(&template, seller, buyer)?;
    if let Err(problems) = validation::validate(&payload) {
        for problem in problems {
            tracing::warn!(%problem, "Composed payload is incomplete");
        }
    }

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn serve(cfg: AppConfig, settings: RelaySettings) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg
        .relay
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", cfg.relay.bind_addr))?;

    let client = create_invoice_client(&cfg, &settings)?;
    tracing::info!(?settings, "Relay settings resolved");
    let relay = Relay::new(settings, client);

    let routes = routes::routes(relay, &cfg.relay.route);
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(addr = %bound, route = %cfg.relay.route, "Invoice relay listening");
    server.await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match cli.command {
        Some(Command::StoreToken { mode }) => store_token(mode),
        Some(Command::InitConfig) => {
            let (cfg, _) = config::load_from_environment();
            config::store(&cfg)?;
            tracing::info!("Config file written");
            Ok(())
        }
        Some(Command::Compose {
            template,
            seller_ntn_cnic,
            seller_business_name,
            seller_province,
            seller_address,
            buyer_ntn_cnic,
            buyer_business_name,
            buyer_province,
            buyer_address,
        }) => {
            let seller = Party {
                ntn_cnic: seller_ntn_cnic,
                business_name: seller_business_name,
                province: seller_province,
                address: seller_address,
            };
            let buyer = BuyerEdits {
                ntn_cnic: buyer_ntn_cnic,
                business_name: buyer_business_name,
                province: buyer_province,
                address: buyer_address,
            };
            print_composed(template, seller, buyer)
        }
        None => {
            let (cfg, settings) = config::load_from_environment();
            serve(cfg, settings).await
        }
    }
}
