//! HTTP handler functions for the relief map API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use relief_map_report_models::Report;
use relief_map_server_models::{
    ApiAlert, ApiHealth, ApiReport, ApiReportStats, ApiUser, ApiZoneWeather, CreateAlertRequest,
    LoginRequest, LoginResponse, RegisterRequest, ReportCommandRequest, SubmitReportRequest,
};
use relief_map_user_models::{NewUser, Role};

use crate::AppState;
use crate::error::ApiError;
use crate::session::{Authenticated, OptionalSession};

type ApiResult = Result<HttpResponse, ApiError>;

fn reports_json(reports: Vec<Report>) -> HttpResponse {
    HttpResponse::Ok().json(reports.into_iter().map(ApiReport::from).collect::<Vec<_>>())
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/login`
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    let body = body.into_inner();
    let directory = state.clone();
    let user =
        web::block(move || directory.users.authenticate(&body.username, &body.password)).await??;
    let (token, expires_at) = state.sessions.issue(user.caller(), Utc::now());
    log::info!("{} ({}) logged in", user.name, user.role);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        expires_at,
        user: user.into(),
    }))
}

/// `POST /api/logout`
pub async fn logout(state: web::Data<AppState>, session: Authenticated) -> HttpResponse {
    state.sessions.revoke(&session.token);
    HttpResponse::NoContent().finish()
}

/// `POST /api/users`
///
/// Anyone may register a citizen; staff accounts need an admin session.
/// A stale token is a 401, not an anonymous registration.
pub async fn register(
    state: web::Data<AppState>,
    session: OptionalSession,
    body: web::Json<RegisterRequest>,
) -> ApiResult {
    let requested_by = session.0.map(|s| s.caller);
    let new_user: NewUser = body.into_inner().into();
    let directory = state.clone();
    let user =
        web::block(move || directory.users.register(requested_by.as_ref(), new_user)).await??;
    Ok(HttpResponse::Created().json(ApiUser::from(user)))
}

/// `GET /api/users/workers`
pub async fn workers(state: web::Data<AppState>, session: Authenticated) -> ApiResult {
    if !session.caller.is_admin() {
        return Err(ApiError::forbidden("Only admins may list workers"));
    }
    let workers: Vec<ApiUser> = state
        .users
        .list_by_role(Role::Worker)?
        .into_iter()
        .map(ApiUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(workers))
}

/// `POST /api/reports`
pub async fn submit_report(
    state: web::Data<AppState>,
    session: Authenticated,
    body: web::Json<SubmitReportRequest>,
) -> ApiResult {
    let report = state
        .reports
        .submit(&session.caller, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(ApiReport::from(report)))
}

/// `GET /api/reports`
pub async fn list_reports(state: web::Data<AppState>, _session: Authenticated) -> ApiResult {
    Ok(reports_json(state.reports.list()?))
}

/// `GET /api/reports/mine`
pub async fn my_reports(state: web::Data<AppState>, session: Authenticated) -> ApiResult {
    Ok(reports_json(state.reports.list_for(&session.caller)?))
}

/// `GET /api/reports/map`
///
/// Open reports plus those resolved within the last day.
pub async fn map_reports(state: web::Data<AppState>, _session: Authenticated) -> ApiResult {
    Ok(reports_json(state.reports.active_map(Utc::now())?))
}

/// `GET /api/reports/stats`
pub async fn report_stats(state: web::Data<AppState>, _session: Authenticated) -> ApiResult {
    let stats = state.reports.stats()?;
    Ok(HttpResponse::Ok().json(ApiReportStats {
        pending: stats.pending,
        in_progress: stats.in_progress,
        under_review: stats.under_review,
        resolved: stats.resolved,
        total: stats.total,
    }))
}

/// `GET /api/reports/{id}`
pub async fn get_report(
    state: web::Data<AppState>,
    _session: Authenticated,
    path: web::Path<String>,
) -> ApiResult {
    let report = state.reports.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiReport::from(report)))
}

/// `PATCH /api/reports/{id}`
///
/// Accepts only explicit lifecycle commands, never raw field updates.
/// The compare-and-swap loop runs on the blocking pool.
pub async fn update_report(
    state: web::Data<AppState>,
    session: Authenticated,
    path: web::Path<String>,
    body: web::Json<ReportCommandRequest>,
) -> ApiResult {
    let (caller, id, command) = (session.caller, path.into_inner(), body.into_inner());
    let service = state.clone();
    let report = web::block(move || service.reports.execute(&caller, &id, &command)).await??;
    Ok(HttpResponse::Ok().json(ApiReport::from(report)))
}

/// `GET /api/alerts`
///
/// Active, unexpired alerts, newest first.
pub async fn list_alerts(state: web::Data<AppState>) -> ApiResult {
    let alerts: Vec<ApiAlert> = state
        .alerts
        .list_active(Utc::now())?
        .into_iter()
        .map(ApiAlert::from)
        .collect();
    Ok(HttpResponse::Ok().json(alerts))
}

/// `POST /api/alerts`
pub async fn create_alert(
    state: web::Data<AppState>,
    session: Authenticated,
    body: web::Json<CreateAlertRequest>,
) -> ApiResult {
    let alert = state
        .alerts
        .create(&session.caller, body.into_inner().into(), Utc::now())?;
    Ok(HttpResponse::Created().json(ApiAlert::from(alert)))
}

/// `PATCH /api/alerts/{id}/deactivate`
pub async fn deactivate_alert(
    state: web::Data<AppState>,
    session: Authenticated,
    path: web::Path<String>,
) -> ApiResult {
    let alert = state
        .alerts
        .deactivate(&session.caller, &path.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiAlert::from(alert)))
}

/// `GET /api/weather/overview`
pub async fn weather_overview(state: web::Data<AppState>) -> ApiResult {
    let zones: Vec<ApiZoneWeather> = state
        .reports
        .zone_overview()
        .await?
        .into_iter()
        .map(|z| ApiZoneWeather {
            zone: z.zone.name,
            center: z.zone.center,
            radius_meters: z.zone.radius_meters,
            weather: z.weather,
            open_reports: z.open_reports,
        })
        .collect();
    Ok(HttpResponse::Ok().json(zones))
}

/// `GET /api/service-area`
///
/// The geofence as a `GeoJSON` feature.
pub async fn service_area(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.reports.area().geofence_feature())
}
