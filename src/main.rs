use std::sync::Arc;

use clap::Parser;
use poem::{Server, listener::TcpListener};

use orgchart_backend::api::build_app;
use orgchart_backend::app_data::AppData;
use orgchart_backend::cli::{self, Cli, Commands};
use orgchart_backend::config::{
    BootstrapSettings, SecretManager, init_database, init_logging, migrate_database,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before anything reads them
    dotenv::dotenv().ok();

    init_logging()?;

    let cli = Cli::parse();
    let settings = BootstrapSettings::from_env()?;

    if let Some(Commands::Migrate) = cli.command {
        return cli::migrate::run_migrations(&settings).await;
    }

    let secret_manager = SecretManager::init()?;

    let db = init_database(&settings).await?;
    migrate_database(&db).await?;

    let app_data = Arc::new(AppData::init(db, settings, secret_manager)?);

    match cli.command {
        None | Some(Commands::Serve) => serve(app_data).await?,
        Some(command) => cli::execute_command(command, &app_data).await?,
    }

    Ok(())
}

async fn serve(app_data: Arc<AppData>) -> Result<(), std::io::Error> {
    let address = app_data.settings.server_address();

    tracing::info!("Starting server on http://{}", address);
    tracing::info!("Swagger UI available at http://{}/swagger", address);

    Server::new(TcpListener::bind(address))
        .run(build_app(app_data))
        .await
}
