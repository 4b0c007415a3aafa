#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the relief map application.
//!
//! Serves the REST API for filing and progressing incident reports,
//! managing accounts and sessions, and broadcasting hazard alerts. The
//! weather watcher runs as a background task on the same runtime.

pub mod config;
pub mod error;
mod handlers;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use relief_map_alert::{AlertBoard, WeatherWatcher};
use relief_map_database::Database;
use relief_map_geography::region::ServiceArea;
use relief_map_report::ReportService;
use relief_map_user::UserDirectory;
use relief_map_weather::WeatherProvider;

pub use config::ServerConfig;
use error::ApiError;
use session::SessionStore;

/// Shared application state.
pub struct AppState {
    /// Report workflow.
    pub reports: ReportService,
    /// Account registry.
    pub users: UserDirectory,
    /// Broadcast alerts.
    pub alerts: AlertBoard,
    /// Issued bearer tokens.
    pub sessions: SessionStore,
}

impl AppState {
    #[must_use]
    pub fn new(
        db: &Database,
        weather: Arc<dyn WeatherProvider>,
        area: Arc<ServiceArea>,
        weather_timeout: Duration,
        session_ttl: chrono::Duration,
    ) -> Self {
        Self {
            reports: ReportService::new(db.clone(), weather, area, weather_timeout),
            users: UserDirectory::new(db.clone()),
            alerts: AlertBoard::new(db.clone()),
            sessions: SessionStore::new(session_ttl),
        }
    }
}

/// Registers the `/api` routes and JSON error handling.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation {
            field: None,
            message: err.to_string(),
        }
        .into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::post().to(handlers::logout))
            .route("/users", web::post().to(handlers::register))
            .route("/users/workers", web::get().to(handlers::workers))
            .route("/reports", web::post().to(handlers::submit_report))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports/mine", web::get().to(handlers::my_reports))
            .route("/reports/map", web::get().to(handlers::map_reports))
            .route("/reports/stats", web::get().to(handlers::report_stats))
            .route("/reports/{id}", web::get().to(handlers::get_report))
            .route("/reports/{id}", web::patch().to(handlers::update_report))
            .route("/alerts", web::get().to(handlers::list_alerts))
            .route("/alerts", web::post().to(handlers::create_alert))
            .route(
                "/alerts/{id}/deactivate",
                web::patch().to(handlers::deactivate_alert),
            )
            .route("/weather/overview", web::get().to(handlers::weather_overview))
            .route("/service-area", web::get().to(handlers::service_area)),
    );
}

/// Starts the relief map API server.
///
/// Opens the document store, loads the service region, builds the
/// weather provider, creates the bootstrap admin if configured, spawns
/// the weather watcher, and serves HTTP until shutdown. The caller
/// provides the async runtime (e.g. via `#[actix_web::main]`) and the
/// logger.
///
/// # Errors
///
/// Returns an `std::io::Result` error if startup fails or the HTTP server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening document store...");
    let db = Database::open_from_env().map_err(std::io::Error::other)?;

    let area = Arc::new(ServiceArea::from_env().map_err(std::io::Error::other)?);
    log::info!("Serving {} ({} zones)", area.name, area.zones.len());

    let provider: Arc<dyn WeatherProvider> = Arc::from(
        config
            .weather
            .build_provider()
            .map_err(std::io::Error::other)?,
    );

    let state = web::Data::new(AppState::new(
        &db,
        Arc::clone(&provider),
        Arc::clone(&area),
        config.weather.timeout,
        config.session_ttl,
    ));

    if let Some(admin) = &config.bootstrap_admin {
        let created = state
            .users
            .ensure_admin(&admin.name, &admin.password, &admin.phone, &admin.department)
            .map_err(std::io::Error::other)?;
        if created {
            log::info!("Created bootstrap admin {}", admin.name);
        }
    }

    let _watcher = WeatherWatcher::new(
        AlertBoard::new(db.clone()),
        provider,
        area,
        config.weather.timeout,
    )
    .spawn(config.watch_interval);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((config.bind_addr.clone(), config.port))?
    .run()
    .await;

    log::info!("Server stopped; flushing document store");
    db.flush().map_err(std::io::Error::other)?;
    server
}
