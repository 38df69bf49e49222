//! HTTP API for Guardian
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /register - Register the installation's user (409 once registered)
//! - POST /login - Verify PIN (sends intruder alert on breach)
//! - POST /sos - Emergency alert to all contacts
//! - POST /intruder - Intruder alert to opted-in contacts
//! - GET /contacts - List contacts
//! - POST /contacts - Add contact
//! - DELETE /contacts/:id - Remove contact

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::AuthError;
use crate::core::contacts::ContactError;
use crate::core::guardian::{Guardian, LoginResult};
use crate::types::{Contact, DispatchOutcome, NewContact, NewUser};

/// App state
pub struct AppState {
    pub guardian: Guardian,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
}

/// Registration response (the stored PIN is never echoed)
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Add contact request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContactRequest {
    pub name: String,
    pub phone: String,
    #[serde(default = "default_true")]
    pub receive_intruder_alert: bool,
}

fn default_true() -> bool {
    true
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub user_registered: bool,
}

/// Create the API router
pub fn create_router(guardian: Guardian) -> Router {
    let state = Arc::new(AppState { guardian });

    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/sos", post(sos))
        .route("/intruder", post(intruder))
        .route("/contacts", get(list_contacts).post(add_contact))
        .route("/contacts/:id", delete(remove_contact))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let user_registered = state.guardian.auth().user_exists().await.unwrap_or(false);
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        user_registered,
    })
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewUser>,
) -> Result<Json<RegisterResponse>, StatusCode> {
    let credential = state
        .guardian
        .auth()
        .register_user(req)
        .await
        .map_err(|e| match e {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::AlreadyRegistered => StatusCode::CONFLICT,
            other => {
                tracing::error!(error = %other, "registration failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    Ok(Json(RegisterResponse {
        name: credential.name,
        email: credential.email,
        phone: credential.phone,
    }))
}

/// Verify PIN; failures are reported in the body, not the status
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Json<LoginResult> {
    Json(state.guardian.login(&req.pin).await)
}

async fn sos(State(state): State<Arc<AppState>>) -> Json<DispatchOutcome> {
    Json(state.guardian.send_emergency_alert().await)
}

async fn intruder(State(state): State<Arc<AppState>>) -> Json<DispatchOutcome> {
    Json(state.guardian.send_intruder_alert().await)
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, StatusCode> {
    state
        .guardian
        .contacts()
        .list()
        .await
        .map(Json)
        .map_err(contact_status)
}

async fn add_contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddContactRequest>,
) -> Result<(StatusCode, Json<Contact>), StatusCode> {
    let contact = state
        .guardian
        .contacts()
        .add(NewContact::new(req.name, req.phone), req.receive_intruder_alert)
        .await
        .map_err(contact_status)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn remove_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .guardian
        .contacts()
        .remove(&id)
        .await
        .map_err(contact_status)?;
    Ok(StatusCode::NO_CONTENT)
}

fn contact_status(e: ContactError) -> StatusCode {
    match e {
        ContactError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ContactError::NotFound(_) => StatusCode::NOT_FOUND,
        other => {
            tracing::error!(error = %other, "contact directory failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Run the API server
pub async fn run_server(addr: &str, guardian: Guardian) -> std::io::Result<()> {
    let router = create_router(guardian);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "Guardian API listening");
    axum::serve(listener, router).await
}
