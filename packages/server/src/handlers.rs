//! HTTP handler functions for the chipping API.

use actix_web::{HttpRequest, HttpResponse, web};
use chipping_analytics::analyze_area;
use chipping_analytics_models::DateInterval;
use chipping_area::{create_area, delete_area, get_area, update_area};
use chipping_area_models::AreaDraft;
use chipping_database_models::Role;
use chipping_server_models::{AnalyticsQueryParams, ApiArea, ApiHealth, AreaRequest};

use crate::AppState;
use crate::auth::{authenticate, require_role};
use crate::error::ServerError;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /areas/{id}`
pub async fn area(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    authenticate(&req, &state).await?;

    let area = get_area(&state.store, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiArea::from(area)))
}

/// `POST /areas`
///
/// Admin only. Responds `201 Created` with the stored area.
pub async fn add_area(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AreaRequest>,
) -> Result<HttpResponse, ServerError> {
    let account = authenticate(&req, &state).await?;
    require_role(&account, &[Role::Admin])?;

    let area = create_area(&state.store, &AreaDraft::from(body.into_inner())).await?;
    Ok(HttpResponse::Created().json(ApiArea::from(area)))
}

/// `PUT /areas/{id}`
///
/// Admin only. Replaces the name and the whole boundary.
pub async fn replace_area(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AreaRequest>,
) -> Result<HttpResponse, ServerError> {
    let account = authenticate(&req, &state).await?;
    require_role(&account, &[Role::Admin])?;

    let area = update_area(
        &state.store,
        path.into_inner(),
        &AreaDraft::from(body.into_inner()),
    )
    .await?;
    Ok(HttpResponse::Ok().json(ApiArea::from(area)))
}

/// `DELETE /areas/{id}`
///
/// Admin only.
pub async fn remove_area(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let account = authenticate(&req, &state).await?;
    require_role(&account, &[Role::Admin])?;

    delete_area(&state.store, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// `GET /areas/{id}/analytics?startDate&endDate`
///
/// Counts animals present in, arriving to, and leaving the area over the
/// interval, broken down by animal type.
pub async fn area_analytics(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    params: web::Query<AnalyticsQueryParams>,
) -> Result<HttpResponse, ServerError> {
    authenticate(&req, &state).await?;

    let interval = DateInterval::parse(&params.start_date, &params.end_date)?;
    let area = get_area(&state.store, path.into_inner()).await?;

    let analytics = analyze_area(&state.store, &area, &interval).await?;
    Ok(HttpResponse::Ok().json(analytics))
}
