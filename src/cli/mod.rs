// CLI module for operations that run against the database directly

pub mod create_admin;
pub mod migrate;
pub mod seed_units;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// Organizational chart backend
#[derive(Parser, Debug)]
#[command(name = "orgchart_backend")]
#[command(about = "Organizational chart administration backend", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        username: Option<String>,
    },

    /// Insert the default faculty unit hierarchy (skips existing codes)
    SeedUnits,
}

/// Execute a non-server CLI command
///
/// # Arguments
/// * `command` - Parsed subcommand other than `serve`
/// * `app_data` - Application data containing all stores and providers
pub async fn execute_command(
    command: Commands,
    app_data: &AppData,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve | Commands::Migrate => {}
        Commands::CreateAdmin {
            name,
            email,
            password,
            username,
        } => {
            let admin = create_admin::create_admin(
                app_data,
                create_admin::AdminAccount {
                    name,
                    email,
                    password,
                    username,
                },
            )
            .await?;
            println!("Admin account created: {} <{}>", admin.id, admin.email);
        }
        Commands::SeedUnits => {
            let created = seed_units::seed_units(app_data).await?;
            println!("Seeded {} unit(s)", created);
        }
    }

    Ok(())
}
