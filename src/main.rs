use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use alacena::config::{self, Config};
use alacena::expiration::{self, DateStamp, ExpirationStatus};
use alacena::{FileStore, InventoryApi, ReqwestHttpClient, TracingNavigator};

#[derive(Debug, Parser)]
#[command(name = "alacena", version, about = "Pantry inventory client")]
struct Cli {
    /// Backend URL, overrides the configuration file
    #[arg(long, env = "ALACENA_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session tokens
    Login { username: String, password: String },
    /// Create an account
    Register { username: String, password: String },
    /// Forget the stored session
    Logout,
    /// List products with their expiration status
    Products,
    /// Count products per expiration status
    Tally,
    /// Classify a single expiration date
    Classify {
        date: String,
        /// Reference date, defaults to today
        #[arg(long)]
        now: Option<String>,
    },
    /// Print a date as DD/MM/YYYY
    FormatDate { date: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "alacena=debug,warn".into()
            } else {
                "alacena=info,warn".into()
            }
        }))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    match env_file_path {
        Some(path) => info!("Loaded environment variables from {}", path.display()),
        None => debug!("No .env file found. Using existing environment variables."),
    };

    let cli = Cli::parse();
    let base_url = cli.base_url;

    match cli.command {
        Command::Login { username, password } => {
            connect(base_url).await?.login(&username, &password).await?;
            println!("Logged in as {username}");
        }
        Command::Register { username, password } => {
            connect(base_url)
                .await?
                .register(&username, &password)
                .await?;
            println!("Account {username} created, you can now log in");
        }
        Command::Logout => {
            connect(base_url).await?.logout().await;
            println!("Logged out");
        }
        Command::Products => {
            let now = Utc::now();
            for product in connect(base_url).await?.products().await? {
                let status = product.status(now)?;
                println!(
                    "{:<24} {:>8} {:<10} {}  {:<12} {}",
                    product.name,
                    product.quantity,
                    product.unit_label(),
                    product.formatted_expiration()?,
                    status.label(),
                    status.color(),
                );
            }
        }
        Command::Tally => {
            let products = connect(base_url).await?.products().await?;
            let tally = expiration::tally(&products, Utc::now());
            for status in ExpirationStatus::ALL {
                println!("{:<12} {}", status.label(), tally.count(status));
            }
            println!("{:<12} {}", "total", tally.total());
        }
        Command::Classify { date, now } => classify(&date, now.as_deref())?,
        Command::FormatDate { date } => println!("{}", expiration::format_date(&date)?),
    }

    Ok(())
}

/// Load configuration and build a client backed by the credentials file
async fn connect(base_url: Option<String>) -> Result<InventoryApi<ReqwestHttpClient>> {
    let mut config = config::load_config()
        .await
        .context("failed to load configuration")?;
    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }
    config.validate()?;
    build_api(&config)
}

fn build_api(config: &Config) -> Result<InventoryApi<ReqwestHttpClient>> {
    let transport = ReqwestHttpClient::with_timeout(config.request_timeout())?;
    let store = Arc::new(FileStore::new(&config.storage.credentials_path));
    debug!(
        base_url = %config.api.base_url,
        credentials = %config.storage.credentials_path.display(),
        "Inventory client ready"
    );
    Ok(InventoryApi::new(
        transport,
        config.api.base_url.clone(),
        store,
        Arc::new(TracingNavigator),
    ))
}

fn classify(date: &str, now: Option<&str>) -> Result<()> {
    let expiration = DateStamp::parse(date)?;
    let reference_now = match now {
        Some(now) => DateStamp::parse(now)?.start_of_day(),
        None => Utc::now(),
    };

    let status = expiration::classify_expiration(&expiration, reference_now);
    println!(
        "{} {} ({} days) {}",
        expiration.to_display(),
        status.label(),
        expiration::days_until(&expiration, reference_now),
        status.color()
    );
    Ok(())
}
