#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Operator CLI for the relief map server.
//!
//! ```text
//! relief_map_cli serve
//! relief_map_cli create-staff --name team-a --role worker --department "Disaster Response" --phone 9000000002
//! relief_map_cli check-weather
//! relief_map_cli users [--role worker]
//! ```
//!
//! Running with no subcommand enters interactive mode. Commands other
//! than `serve` open the document store directly, so they cannot run
//! while a server holds it.

mod staff;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use relief_map_alert::{AlertBoard, WatchOutcome, WeatherWatcher};
use relief_map_database::Database;
use relief_map_geography::region::ServiceArea;
use relief_map_server::ServerConfig;
use relief_map_user::UserDirectory;
use relief_map_user_models::Role;
use relief_map_weather::{WeatherConfig, WeatherProvider};

#[derive(Parser)]
#[command(name = "relief_map_cli", about = "Operate the relief map server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server and weather watcher
    Serve,
    /// Create a worker or admin account
    CreateStaff {
        /// Account name (login username)
        #[arg(long)]
        name: String,
        /// `worker` or `admin`
        #[arg(long, default_value = "worker")]
        role: Role,
        /// Department the account belongs to
        #[arg(long)]
        department: String,
        /// Contact phone number
        #[arg(long)]
        phone: String,
    },
    /// Run one weather check and publish an alert if warranted
    CheckWeather,
    /// List accounts
    Users {
        /// Only show accounts with this role
        #[arg(long)]
        role: Option<Role>,
    },
}

/// Interactive menu entries.
enum Action {
    Serve,
    CreateStaff,
    CheckWeather,
    Users,
}

impl Action {
    const ALL: &[Self] = &[Self::Serve, Self::CreateStaff, Self::CheckWeather, Self::Users];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Serve => "Start server",
            Self::CreateStaff => "Create staff account",
            Self::CheckWeather => "Check weather now",
            Self::Users => "List users",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => prompt_command()?,
    };

    match command {
        Commands::Serve => {
            // actix runs its own system; keep it off the tokio worker threads.
            tokio::task::spawn_blocking(|| {
                actix_rt::System::new()
                    .block_on(relief_map_server::run_server(ServerConfig::from_env()))
            })
            .await??;
        }
        Commands::CreateStaff {
            name,
            role,
            department,
            phone,
        } => {
            let users = UserDirectory::new(Database::open_from_env()?);
            let user = staff::create(&users, name, role, department, phone)?;
            println!("Created {} account {}", user.role, user.name);
        }
        Commands::CheckWeather => check_weather().await?,
        Commands::Users { role } => {
            let users = UserDirectory::new(Database::open_from_env()?);
            let list = match role {
                Some(role) => users.list_by_role(role)?,
                None => users.list_all()?,
            };
            if list.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            println!("{:<24} {:<8} {:<24} PHONE", "NAME", "ROLE", "DEPARTMENT");
            println!("{}", "-".repeat(72));
            for user in &list {
                println!(
                    "{:<24} {:<8} {:<24} {}",
                    user.name,
                    user.role,
                    user.department.as_deref().unwrap_or("-"),
                    user.phone
                );
            }
            println!("\n{} user(s)", list.len());
        }
    }

    Ok(())
}

fn prompt_command() -> Result<Commands, Box<dyn std::error::Error>> {
    println!("Relief Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Action::ALL[idx] {
        Action::Serve => Commands::Serve,
        Action::CreateStaff => staff::prompt_details()?,
        Action::CheckWeather => Commands::CheckWeather,
        Action::Users => Commands::Users { role: None },
    })
}

async fn check_weather() -> Result<(), Box<dyn std::error::Error>> {
    let weather = WeatherConfig::from_env();
    let provider: Arc<dyn WeatherProvider> = Arc::from(weather.build_provider()?);
    let area = Arc::new(ServiceArea::from_env()?);
    let board = AlertBoard::new(Database::open_from_env()?);

    let watcher = WeatherWatcher::new(board, provider, area, weather.timeout);
    match watcher.run_once(chrono::Utc::now()).await? {
        WatchOutcome::Calm => println!("Conditions are calm; no alert needed."),
        WatchOutcome::Suppressed { existing } => println!(
            "Hazardous, but alert {} ({}) is still live.",
            existing.id, existing.title
        ),
        WatchOutcome::Created(alert) => println!(
            "Published {} alert {}: {}",
            alert.severity, alert.id, alert.title
        ),
        WatchOutcome::Skipped => {
            log::warn!("Weather provider unavailable");
            println!("Weather check failed; see logs.");
        }
    }

    Ok(())
}
