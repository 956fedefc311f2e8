use clap::Parser;
use miette::{IntoDiagnostic, Result};
use qrcodes::{settings, shop_sync, storage, web};
use migration::{Migrator, MigratorTrait};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "qrcodes", version, about = "Product QR codes for the merchant dashboard")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database)
    let db = storage::init(&settings.database).await?;
    Migrator::up(&db, None).await.into_diagnostic()?;

    if let Some(file) = &settings.shops.sessions_file {
        shop_sync::sync_sessions_from_file(&db, file).await?;
    }

    // start web server
    web::serve(settings, db).await?;
    Ok(())
}
