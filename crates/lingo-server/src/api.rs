//! HTTP routes
//!
//! | method | path | |
//! |---|---|---|
//! | GET | `/health` | population health and database reachability |
//! | GET | `/metrics` | Prometheus text format |
//! | GET | `/languages` | configured languages |
//! | DELETE | `/languages/:code` | retire a language |
//! | POST | `/entities` | create (requires `x-principal-id`) |
//! | GET, PUT, DELETE | `/entities/:id` | localized read, update, delete |
//! | POST | `/entities/:id/repopulate` | rerun population, `?wait=true` to block |
//! | GET, PUT | `/consent/:principal` | consent record |
//! | GET | `/consent/:principal/history` | consent ledger |
//!
//! Reads pick their language from `?lang=`, then `Accept-Language`, then the
//! registry default.

use axum::extract::{Path, Query, State};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use lingo_common::{EntityId, PrincipalId};
use lingo_i18n::LocaleRegistry;
use lingo_population::{HealthReport, HealthStatus};
use lingo_service::{LocalizedEntityUpdate, NewLocalizedEntity, ServiceContext};
use lingo_store::{AuditContext, ConsentMethod, ConsentUpdate, Entity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub const PRINCIPAL_HEADER: &str = "x-principal-id";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Builds the router with tracing, timeout and optional CORS layers.
pub fn router(ctx: ServiceContext) -> Router {
    let timeout = Duration::from_secs(ctx.config.server.request_timeout_seconds);
    let cors = ctx.config.server.enable_cors;

    let router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/languages", get(list_languages))
        .route("/languages/:code", delete(retire_language))
        .route("/entities", post(create_entity))
        .route("/entities/:id", get(get_entity).put(update_entity).delete(delete_entity))
        .route("/entities/:id/repopulate", post(repopulate))
        .route("/consent/:principal", get(get_consent).put(record_consent))
        .route("/consent/:principal/history", get(consent_history))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout)),
        );

    let router = if cors { router.layer(CorsLayer::permissive()) } else { router };
    router.with_state(ctx)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: HealthStatus,
    database: bool,
    jobs_in_flight: usize,
    shutting_down: bool,
    population: HealthReport,
}

async fn health(State(ctx): State<ServiceContext>) -> (StatusCode, Json<HealthResponse>) {
    let database = ctx.store.ping().await.is_ok();
    let population = ctx.metrics.health_report();
    let status = if database { population.status } else { HealthStatus::Degraded };
    let code = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    let body = HealthResponse {
        status,
        database,
        jobs_in_flight: ctx.scheduler.in_flight(),
        shutting_down: ctx.scheduler.is_shutting_down(),
        population,
    };
    (code, Json(body))
}

async fn metrics(State(ctx): State<ServiceContext>) -> ApiResult<String> {
    ctx.metrics
        .encode_text()
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {e}")))
}

#[derive(Debug, Serialize)]
struct LanguageResponse {
    code: String,
    display_name: String,
    rtl: bool,
    supported: bool,
    default: bool,
}

async fn list_languages(State(ctx): State<ServiceContext>) -> Json<Vec<LanguageResponse>> {
    let default = ctx.registry.default_code().clone();
    let languages = ctx
        .localization
        .languages()
        .into_iter()
        .map(|language| LanguageResponse {
            default: language.code == default,
            code: language.code.to_string(),
            display_name: language.display_name,
            rtl: language.rtl,
            supported: language.supported,
        })
        .collect();
    Json(languages)
}

#[derive(Debug, Serialize)]
struct RetiredResponse {
    language: String,
    translations_removed: u64,
}

async fn retire_language(
    State(ctx): State<ServiceContext>,
    Path(code): Path<String>,
) -> ApiResult<Json<RetiredResponse>> {
    let translations_removed = ctx.localization.retire_language(&code).await?;
    Ok(Json(RetiredResponse {
        language: code,
        translations_removed,
    }))
}

#[derive(Debug, Serialize)]
struct WriteResponse {
    entity: Entity,
    population_scheduled: bool,
}

async fn create_entity(
    State(ctx): State<ServiceContext>,
    headers: HeaderMap,
    Json(new): Json<NewLocalizedEntity>,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let owner = principal_from_headers(&headers)?;
    let write = ctx.localization.create_entity(owner, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(WriteResponse {
            population_scheduled: write.population.is_some(),
            entity: write.entity,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

async fn get_entity(
    State(ctx): State<ServiceContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let requested = requested_language(query.lang, &headers, &ctx.registry);
    let view = ctx.localization.get_localized_view(EntityId(id), &requested).await?;

    let mut response = Json(&view).into_response();
    if let Some(served) = &view.served_language {
        if let Ok(value) = HeaderValue::from_str(served.as_str()) {
            response.headers_mut().insert(CONTENT_LANGUAGE, value);
        }
    }
    Ok(response)
}

async fn update_entity(
    State(ctx): State<ServiceContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<LocalizedEntityUpdate>,
) -> ApiResult<Json<WriteResponse>> {
    let write = ctx.localization.update_entity(EntityId(id), update).await?;
    Ok(Json(WriteResponse {
        population_scheduled: write.population.is_some(),
        entity: write.entity,
    }))
}

async fn delete_entity(State(ctx): State<ServiceContext>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    ctx.localization.delete_entity(EntityId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RepopulateQuery {
    #[serde(default)]
    wait: bool,
}

async fn repopulate(
    State(ctx): State<ServiceContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<RepopulateQuery>,
) -> ApiResult<Response> {
    let ticket = ctx.localization.repopulate(EntityId(id)).await?;
    if !query.wait {
        let body = serde_json::json!({ "entity_id": ticket.entity_id(), "revision": ticket.revision() });
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    let report = ticket
        .wait()
        .await
        .map_err(|e| ApiError::Service(e.into()))?;
    Ok(Json(report).into_response())
}

#[derive(Debug, Deserialize)]
struct ConsentRequest {
    #[serde(flatten)]
    update: ConsentUpdate,
    #[serde(default)]
    method: ConsentMethod,
}

async fn record_consent(
    State(ctx): State<ServiceContext>,
    Path(principal): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ConsentRequest>,
) -> ApiResult<Response> {
    let principal = PrincipalId::new(principal)?;
    let audit = AuditContext {
        ip_address: header_str(&headers, FORWARDED_FOR)
            .and_then(|value| value.split(',').next())
            .map(|ip| ip.trim().to_string()),
        user_agent: header_str(&headers, USER_AGENT.as_str()).map(str::to_string),
        method: request.method,
    };
    let record = ctx.consent.record_consent(&principal, request.update, audit).await?;
    Ok(Json(record).into_response())
}

async fn get_consent(State(ctx): State<ServiceContext>, Path(principal): Path<String>) -> ApiResult<Response> {
    let principal = PrincipalId::new(principal)?;
    let record = ctx.consent.get_consent(&principal).await?;
    Ok(Json(record).into_response())
}

async fn consent_history(
    State(ctx): State<ServiceContext>,
    Path(principal): Path<String>,
) -> ApiResult<Response> {
    let principal = PrincipalId::new(principal)?;
    let history = ctx.consent.consent_history(&principal).await?;
    Ok(Json(history).into_response())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn principal_from_headers(headers: &HeaderMap) -> ApiResult<PrincipalId> {
    let raw = header_str(headers, PRINCIPAL_HEADER).ok_or(ApiError::MissingHeader(PRINCIPAL_HEADER))?;
    Ok(PrincipalId::new(raw)?)
}

/// `?lang=` wins, then `Accept-Language`, then the default language.
pub fn requested_language(lang: Option<String>, headers: &HeaderMap, registry: &LocaleRegistry) -> String {
    if let Some(lang) = lang.filter(|l| !l.trim().is_empty()) {
        return lang;
    }
    let negotiated = match header_str(headers, ACCEPT_LANGUAGE.as_str()) {
        Some(header) => registry.negotiate(header),
        None => registry.default_code().clone(),
    };
    debug!(language = %negotiated, "Negotiated request language");
    negotiated.to_string()
}
