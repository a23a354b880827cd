//! API request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use crate::error::StudioError;
use crate::models::{
    CreateDesign, CreateEmail, CreateProvider, Email, EmailDesign, EmailProvider,
    ProviderTestRequest, SendEmailRequest, SendResponse, SendTestRequest, UpdateDesign,
    UpdateEmail, UpdateProvider,
};
use crate::sender::{Mailer, OutgoingMessage};
use crate::storage::Storage;

/// Shared application state
pub struct AppState {
    pub storage: Arc<Storage>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

type Rejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<T, Rejection>;

fn reject(status: StatusCode, msg: impl Into<String>) -> Rejection {
    (status, Json(ApiError::new(msg)))
}

fn storage_error(e: StudioError) -> Rejection {
    let status = match &e {
        StudioError::NotFound(_) => StatusCode::NOT_FOUND,
        StudioError::Conflict(_) => StatusCode::CONFLICT,
        StudioError::Parse(_) | StudioError::Query(_) => StatusCode::BAD_REQUEST,
        StudioError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => {
            error!("internal error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    reject(status, e.to_string())
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

// Emails

/// GET /api/emails - List emails, most recently edited first
pub async fn list_emails(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Email>>> {
    let emails = state
        .storage
        .emails()
        .find_many()
        .await
        .map_err(storage_error)?;
    Ok(Json(emails))
}

/// POST /api/emails - Create an email
pub async fn create_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateEmail>,
) -> ApiResult<(StatusCode, Json<Email>)> {
    if payload.title.is_empty() || payload.content.is_empty() || payload.design.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "title, content and design are required",
        ));
    }

    let email = state
        .storage
        .emails()
        .create(payload)
        .await
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(email)))
}

/// GET /api/emails/:id
pub async fn get_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Email>> {
    let email = state
        .storage
        .emails()
        .find_by_id(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "email not found"))?;
    Ok(Json(email))
}

/// PUT /api/emails/:id - Partial update
pub async fn update_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmail>,
) -> ApiResult<Json<Email>> {
    let email = state
        .storage
        .emails()
        .update(&id, payload)
        .await
        .map_err(storage_error)?;
    Ok(Json(email))
}

/// DELETE /api/emails/:id
pub async fn delete_email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .storage
        .emails()
        .delete(&id)
        .await
        .map_err(storage_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Designs

/// GET /api/designs - List designs, newest first
pub async fn list_designs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<EmailDesign>>> {
    let designs = state
        .storage
        .designs()
        .find_many()
        .await
        .map_err(storage_error)?;
    Ok(Json(designs))
}

/// POST /api/designs - Create a design
///
/// Name uniqueness is a pre-check here, not a storage constraint; the
/// relational schema carries a UNIQUE backstop for the lost-race case.
pub async fn create_design(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<CreateDesign>,
) -> ApiResult<(StatusCode, Json<EmailDesign>)> {
    if payload.name.is_empty() || payload.description.is_empty() || payload.design.is_null() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "name, description and design are required",
        ));
    }

    let existing = state
        .storage
        .designs()
        .find_by_name(&payload.name)
        .await
        .map_err(storage_error)?;
    if existing.is_some() {
        return Err(reject(
            StatusCode::CONFLICT,
            format!("design name already exists: {}", payload.name),
        ));
    }

    // System designs only come from seeding, never from the API.
    payload.is_system = Some(false);

    let design = state
        .storage
        .designs()
        .create(payload)
        .await
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(design)))
}

/// GET /api/designs/:id
pub async fn get_design(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmailDesign>> {
    let design = state
        .storage
        .designs()
        .find_by_id(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "design not found"))?;
    Ok(Json(design))
}

/// PUT /api/designs/:id - Partial update with name uniqueness re-check
pub async fn update_design(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDesign>,
) -> ApiResult<Json<EmailDesign>> {
    if let Some(name) = &payload.name {
        let existing = state
            .storage
            .designs()
            .find_by_name(name)
            .await
            .map_err(storage_error)?;
        if let Some(existing) = existing {
            if existing.id != id {
                return Err(reject(
                    StatusCode::CONFLICT,
                    format!("design name already exists: {}", name),
                ));
            }
        }
    }

    let design = state
        .storage
        .designs()
        .update(&id, payload)
        .await
        .map_err(storage_error)?;
    Ok(Json(design))
}

/// DELETE /api/designs/:id
pub async fn delete_design(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .storage
        .designs()
        .delete(&id)
        .await
        .map_err(storage_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// Providers

#[derive(Debug, Deserialize)]
pub struct ProvidersQuery {
    pub active: Option<bool>,
}

/// GET /api/providers - List providers; `?active=true` filters to enabled ones
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProvidersQuery>,
) -> ApiResult<Json<Vec<EmailProvider>>> {
    let providers = if query.active == Some(true) {
        state.storage.providers().find_active().await
    } else {
        state.storage.providers().find_many().await
    }
    .map_err(storage_error)?;
    Ok(Json(providers))
}

/// Provider payloads are decoded by hand so an unknown `type` comes back
/// as a 400 with the same error shape as the other validation failures,
/// not as an extractor rejection.
fn decode_provider<T: serde::de::DeserializeOwned>(payload: Value) -> ApiResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("invalid provider payload: {}", e)))
}

/// POST /api/providers - Create a provider
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<EmailProvider>)> {
    let payload: CreateProvider = decode_provider(payload)?;
    if payload.name.is_empty() || payload.config.is_empty() || payload.sender_email.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "name, type, config and sender email are required",
        ));
    }

    let provider = state
        .storage
        .providers()
        .create(payload)
        .await
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// GET /api/providers/:id
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmailProvider>> {
    let provider = state
        .storage
        .providers()
        .find_by_id(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "provider not found"))?;
    Ok(Json(provider))
}

/// PUT /api/providers/:id
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<EmailProvider>> {
    let payload: UpdateProvider = decode_provider(payload)?;
    let provider = state
        .storage
        .providers()
        .update(&id, payload)
        .await
        .map_err(storage_error)?;
    Ok(Json(provider))
}

/// DELETE /api/providers/:id
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .storage
        .providers()
        .delete(&id)
        .await
        .map_err(storage_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/providers/:id/test - Live connection probe plus a test message
pub async fn test_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ProviderTestRequest>,
) -> ApiResult<Json<SendResponse>> {
    if payload.to.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "recipient address is required",
        ));
    }

    let provider = state
        .storage
        .providers()
        .find_by_id(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "provider not found"))?;

    let mailer = Mailer::from_provider(&provider).map_err(storage_error)?;
    mailer.verify().await.map_err(storage_error)?;

    let message = OutgoingMessage {
        to: payload.to,
        subject: "Mail service test".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; padding: 20px;">
  <h2 style="color: #333;">Mail service test</h2>
  <p>This is a test message from <strong>{}</strong>.</p>
  <p>If you received this email, the provider configuration works.</p>
  <p style="color: #666; font-size: 12px;">Sent at: {}</p>
</div>"#,
            provider.name,
            Utc::now().to_rfc2822()
        ),
    };

    let message_id = mailer.send(&message).await.map_err(storage_error)?;

    Ok(Json(SendResponse {
        message: "test email sent".to_string(),
        message_id,
    }))
}

/// POST /api/send - Send an authored email through a provider
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendEmailRequest>,
) -> ApiResult<Json<SendResponse>> {
    if payload.email_id.is_empty() || payload.to.is_empty() || payload.provider_id.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "email id, recipient and provider id are required",
        ));
    }

    let email = state
        .storage
        .emails()
        .find_by_id(&payload.email_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "email not found"))?;

    let provider = state
        .storage
        .providers()
        .find_by_id(&payload.provider_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "provider not found"))?;

    if !provider.is_active {
        return Err(reject(StatusCode::BAD_REQUEST, "provider is not active"));
    }

    let mailer = Mailer::from_provider(&provider).map_err(storage_error)?;
    let message = OutgoingMessage {
        to: payload.to,
        subject: email.title,
        html: email.content,
    };
    let message_id = mailer.send(&message).await.map_err(storage_error)?;

    Ok(Json(SendResponse {
        message: "email sent".to_string(),
        message_id,
    }))
}

/// POST /api/send/test - Direct send without touching stored emails
pub async fn send_test_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendTestRequest>,
) -> ApiResult<Json<SendResponse>> {
    if payload.provider_id.is_empty() || payload.to.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "provider id and recipient are required",
        ));
    }

    let provider = state
        .storage
        .providers()
        .find_by_id(&payload.provider_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "provider not found"))?;

    let mailer = Mailer::from_provider(&provider).map_err(storage_error)?;
    let message = OutgoingMessage {
        to: payload.to,
        subject: payload.subject,
        html: payload.html,
    };
    let message_id = mailer.send(&message).await.map_err(storage_error)?;

    Ok(Json(SendResponse {
        message: "test email sent".to_string(),
        message_id,
    }))
}
