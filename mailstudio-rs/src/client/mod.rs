//! Unified API client
//!
//! One call surface for UI code in both deployment modes. The dispatch
//! strategy is decided once at construction and never re-checked per call:
//! `Local` holds the storage facade and runs in-process (embedded
//! deployments), `Remote` talks to a server's routes over HTTP.
//!
//! Operations that need a live network service by nature — the provider
//! connection test and outbound sends — have no local equivalent and are
//! rejected up front in local mode, before any network activity.

use crate::error::{Result, StudioError};
use crate::models::{
    CreateDesign, CreateEmail, CreateProvider, Email, EmailDesign, EmailProvider,
    ProviderTestRequest, SendEmailRequest, SendResponse, SendTestRequest, UpdateDesign,
    UpdateEmail, UpdateProvider,
};
use crate::storage::Storage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

enum Dispatch {
    Local(Arc<Storage>),
    Remote(RemoteApi),
}

pub struct ApiClient {
    dispatch: Dispatch,
}

impl ApiClient {
    /// In-process dispatch against an embedded deployment.
    pub fn local(storage: Arc<Storage>) -> Self {
        Self {
            dispatch: Dispatch::Local(storage),
        }
    }

    /// HTTP dispatch against a server deployment.
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self {
            dispatch: Dispatch::Remote(RemoteApi {
                http: reqwest::Client::new(),
                base_url: base_url.into(),
            }),
        }
    }

    // Emails

    pub async fn list_emails(&self) -> Result<Vec<Email>> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.emails().find_many().await,
            Dispatch::Remote(api) => api.get("/api/emails").await,
        }
    }

    pub async fn get_email(&self, id: &str) -> Result<Email> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage
                .emails()
                .find_by_id(id)
                .await?
                .ok_or_else(|| StudioError::NotFound(format!("email {} not found", id))),
            Dispatch::Remote(api) => api.get(&format!("/api/emails/{}", id)).await,
        }
    }

    pub async fn create_email(&self, data: CreateEmail) -> Result<Email> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.emails().create(data).await,
            Dispatch::Remote(api) => api.post("/api/emails", &data).await,
        }
    }

    pub async fn update_email(&self, id: &str, patch: UpdateEmail) -> Result<Email> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.emails().update(id, patch).await,
            Dispatch::Remote(api) => api.put(&format!("/api/emails/{}", id), &patch).await,
        }
    }

    pub async fn delete_email(&self, id: &str) -> Result<()> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.emails().delete(id).await,
            Dispatch::Remote(api) => api.delete(&format!("/api/emails/{}", id)).await,
        }
    }

    // Designs

    pub async fn list_designs(&self) -> Result<Vec<EmailDesign>> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.designs().find_many().await,
            Dispatch::Remote(api) => api.get("/api/designs").await,
        }
    }

    pub async fn get_design(&self, id: &str) -> Result<EmailDesign> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage
                .designs()
                .find_by_id(id)
                .await?
                .ok_or_else(|| StudioError::NotFound(format!("design {} not found", id))),
            Dispatch::Remote(api) => api.get(&format!("/api/designs/{}", id)).await,
        }
    }

    /// Create a design. In local mode this client stands in for the route
    /// layer, so the name uniqueness pre-check lives here too.
    pub async fn create_design(&self, data: CreateDesign) -> Result<EmailDesign> {
        match &self.dispatch {
            Dispatch::Local(storage) => {
                if storage.designs().find_by_name(&data.name).await?.is_some() {
                    return Err(StudioError::Conflict(format!(
                        "design name already exists: {}",
                        data.name
                    )));
                }
                storage.designs().create(data).await
            }
            Dispatch::Remote(api) => api.post("/api/designs", &data).await,
        }
    }

    pub async fn update_design(&self, id: &str, patch: UpdateDesign) -> Result<EmailDesign> {
        match &self.dispatch {
            Dispatch::Local(storage) => {
                if let Some(name) = &patch.name {
                    if let Some(existing) = storage.designs().find_by_name(name).await? {
                        if existing.id != id {
                            return Err(StudioError::Conflict(format!(
                                "design name already exists: {}",
                                name
                            )));
                        }
                    }
                }
                storage.designs().update(id, patch).await
            }
            Dispatch::Remote(api) => api.put(&format!("/api/designs/{}", id), &patch).await,
        }
    }

    pub async fn delete_design(&self, id: &str) -> Result<()> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.designs().delete(id).await,
            Dispatch::Remote(api) => api.delete(&format!("/api/designs/{}", id)).await,
        }
    }

    // Providers

    pub async fn list_providers(&self) -> Result<Vec<EmailProvider>> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.providers().find_many().await,
            Dispatch::Remote(api) => api.get("/api/providers").await,
        }
    }

    pub async fn list_active_providers(&self) -> Result<Vec<EmailProvider>> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.providers().find_active().await,
            Dispatch::Remote(api) => api.get("/api/providers?active=true").await,
        }
    }

    pub async fn get_provider(&self, id: &str) -> Result<EmailProvider> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage
                .providers()
                .find_by_id(id)
                .await?
                .ok_or_else(|| StudioError::NotFound(format!("provider {} not found", id))),
            Dispatch::Remote(api) => api.get(&format!("/api/providers/{}", id)).await,
        }
    }

    pub async fn create_provider(&self, data: CreateProvider) -> Result<EmailProvider> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.providers().create(data).await,
            Dispatch::Remote(api) => api.post("/api/providers", &data).await,
        }
    }

    pub async fn update_provider(&self, id: &str, patch: UpdateProvider) -> Result<EmailProvider> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.providers().update(id, patch).await,
            Dispatch::Remote(api) => api.put(&format!("/api/providers/{}", id), &patch).await,
        }
    }

    pub async fn delete_provider(&self, id: &str) -> Result<()> {
        match &self.dispatch {
            Dispatch::Local(storage) => storage.providers().delete(id).await,
            Dispatch::Remote(api) => api.delete(&format!("/api/providers/{}", id)).await,
        }
    }

    // Network-bound operations: no client-local equivalent exists.

    pub async fn test_provider(&self, id: &str, to: &str) -> Result<SendResponse> {
        match &self.dispatch {
            Dispatch::Local(_) => Err(StudioError::UnsupportedInEmbeddedMode(
                "provider connection test requires a server deployment".to_string(),
            )),
            Dispatch::Remote(api) => {
                let body = ProviderTestRequest { to: to.to_string() };
                api.post(&format!("/api/providers/{}/test", id), &body).await
            }
        }
    }

    pub async fn send_email(&self, request: SendEmailRequest) -> Result<SendResponse> {
        match &self.dispatch {
            Dispatch::Local(_) => Err(StudioError::UnsupportedInEmbeddedMode(
                "sending mail requires a server deployment".to_string(),
            )),
            Dispatch::Remote(api) => api.post("/api/send", &request).await,
        }
    }

    pub async fn send_test_email(&self, request: SendTestRequest) -> Result<SendResponse> {
        match &self.dispatch {
            Dispatch::Local(_) => Err(StudioError::UnsupportedInEmbeddedMode(
                "sending mail requires a server deployment".to_string(),
            )),
            Dispatch::Remote(api) => api.post("/api/send/test", &request).await,
        }
    }
}

struct RemoteApi {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RemoteApi {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self.http.delete(self.url(path)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Surface the server's error message under the matching error kind.
    async fn error_from(response: reqwest::Response) -> StudioError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };

        match status.as_u16() {
            404 => StudioError::NotFound(message),
            409 => StudioError::Conflict(message),
            _ => StudioError::Api(message),
        }
    }
}
