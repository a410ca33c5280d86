use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use remote_state::{MemoryStore, RealtimeDbClient, RemoteStateClient};
use serde::de::DeserializeOwned;
use server_api::{
    dispatch, read_actuators, read_sensors, read_sensors_for_listing, require, AccessDenied,
    ApiContext,
};
use shared::{
    domain::{Capability, Identity},
    error::{ApiError, ErrorCode},
    protocol::{
        ActuatorListingView, ControlRequest, DashboardView, DispatchResult, LoginRequest,
        SensorListingView,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod session;

use app_state::AppState;
use config::load_settings;
use session::{session_id_from_headers, SessionStore};

const MAX_BODY_BYTES: usize = 16 * 1024;
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let store: Arc<dyn RemoteStateClient> = match settings.remote_state_url.as_deref() {
        Some(url) => {
            info!(%url, "using realtime database");
            Arc::new(RealtimeDbClient::new(
                url,
                settings.remote_state_auth.clone(),
                settings.store_timeout(),
            )?)
        }
        None => {
            warn!("no remote state url configured; telemetry lives in an in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    if settings.users.is_empty() {
        warn!("user roster is empty; nobody can log in (set APP__USERS=name:role,...)");
    }

    let api = ApiContext::new(store, settings.store_timeout());
    let sessions = SessionStore::new(settings.session_ttl_seconds);
    spawn_session_purger(sessions.clone());

    let state = AppState::new(api, sessions, settings.users.clone());
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_session_purger(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                debug!(removed, "purged expired sessions");
            }
        }
    });
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(http_profile))
        .route("/dashboard", get(http_dashboard))
        .route("/sensors", get(http_sensors))
        .route("/actuators", get(http_actuators))
        .route("/api/actuator/control", post(http_actuator_control))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn not_found() -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError::not_found()))
}

fn denied_response(denied: AccessDenied) -> Response {
    match denied {
        AccessDenied::Unauthenticated => Redirect::to("/login").into_response(),
        AccessDenied::Forbidden => {
            (StatusCode::FORBIDDEN, Json(ApiError::from(denied))).into_response()
        }
    }
}

/// Resolves the session identity and checks it against `capability`.
async fn gate(
    state: &AppState,
    headers: &HeaderMap,
    capability: Capability,
) -> Result<Identity, Response> {
    let identity = state.sessions.identity_from_headers(headers).await;
    match require(identity.as_ref(), capability) {
        Ok(identity) => Ok(identity.clone()),
        Err(denied) => {
            if denied == AccessDenied::Forbidden {
                if let Some(identity) = &identity {
                    warn!(
                        username = %identity.username,
                        role = %identity.role,
                        ?capability,
                        "access denied"
                    );
                }
            }
            Err(denied_response(denied))
        }
    }
}

/// Decodes a form or JSON body, picked by `Content-Type`. Returns `None` when the body
/// does not match the expected shape.
async fn decode_body<T: DeserializeOwned>(request: Request) -> Option<T> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        match Form::<T>::from_request(request, &()).await {
            Ok(Form(value)) => Some(value),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "unparseable form body");
                None
            }
        }
    } else {
        match Json::<T>::from_request(request, &()).await {
            Ok(Json(value)) => Some(value),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "unparseable json body");
                None
            }
        }
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Some(req) = decode_body::<LoginRequest>(request).await else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, "username is required")),
        ));
    };
    let username = req.username.trim();
    let Some(role) = state.users.get(username).copied() else {
        warn!(%username, "login rejected for unknown user");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new(ErrorCode::Unauthorized, "unknown user")),
        ));
    };

    let identity = Identity::new(username, role);
    let session_id = state.sessions.create(identity.clone()).await;
    info!(username = %identity.username, %role, "session created");
    Ok((
        [(header::SET_COOKIE, state.sessions.cookie(&session_id))],
        Json(identity),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session_id) = session_id_from_headers(&headers) {
        state.sessions.destroy(&session_id).await;
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, SessionStore::expired_cookie())],
    )
}

async fn http_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Identity>, Response> {
    let identity = gate(&state, &headers, Capability::ViewTelemetry).await?;
    Ok(Json(identity))
}

async fn http_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardView>, Response> {
    gate(&state, &headers, Capability::ViewTelemetry).await?;
    let read = read_sensors(&state.api).await;
    Ok(Json(DashboardView {
        data: read.data,
        error: read.error,
    }))
}

async fn http_sensors(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SensorListingView>, Response> {
    gate(&state, &headers, Capability::ViewTelemetry).await?;
    let read = read_sensors_for_listing(&state.api).await;
    Ok(Json(SensorListingView {
        sensors: read.data,
        error: read.error,
    }))
}

async fn http_actuators(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ActuatorListingView>, Response> {
    gate(&state, &headers, Capability::ControlActuators).await?;
    let read = read_actuators(&state.api).await;
    Ok(Json(ActuatorListingView {
        actuators: read.data,
        error: read.error,
    }))
}

/// The body is parsed after the gate so that an unauthorized caller never learns anything
/// about command validation. Unparseable bodies count as missing parameters.
async fn http_actuator_control(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<DispatchResult>, Response> {
    let identity = gate(&state, request.headers(), Capability::ControlActuators).await?;

    let request = decode_body::<ControlRequest>(request)
        .await
        .unwrap_or_default();

    match dispatch(&state.api, &request).await {
        Ok(result) => {
            info!(
                username = %identity.username,
                message = %result.message,
                "actuator command accepted"
            );
            Ok(Json(result))
        }
        Err(err) => {
            let status = match err.code() {
                ErrorCode::Validation => StatusCode::BAD_REQUEST,
                ErrorCode::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(err.to_result())).into_response())
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
