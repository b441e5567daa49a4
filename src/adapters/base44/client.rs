//! base44 API Client
//!
//! HTTP client for the base44 app API. Every call is a single
//! request/response: failures are returned to the caller with the raw
//! backend message, nothing is retried.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ports::backend::{BackendError, BackendPort, EntityKind, UploadedFile};

/// base44 client configuration
#[derive(Debug, Clone)]
pub struct Base44Config {
    /// API root, e.g. https://base44.app/api
    pub base_url: String,
    pub app_id: String,
    /// Bearer token for the signed-in user or a service key
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Base44Config {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// base44 backend client
#[derive(Debug)]
pub struct Base44Client {
    config: Base44Config,
    http: Client,
    token: RwLock<Option<String>>,
}

impl Base44Client {
    pub fn new(config: Base44Config) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Http(format!("Failed to create HTTP client: {}", e)))?;

        let token = RwLock::new(config.api_key.clone());
        Ok(Self { config, http, token })
    }

    fn app_url(&self, path: &str) -> String {
        format!("{}/apps/{}/{}", self.config.base_url, self.config.app_id, path)
    }

    fn entity_url(&self, entity: EntityKind) -> String {
        self.app_url(&format!("entities/{}", entity.as_str()))
    }

    async fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_ref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        let response = self
            .authorized(req)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Handle API response and deserialize
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::NotAuthenticated);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: extract_message(&message),
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Failed to parse response: {}", e)))
    }
}

/// base44 errors arrive as `{"message": "..."}`; fall back to the raw body
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn list_params(sort: Option<&str>, limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(sort) = sort {
        params.push(("sort", sort.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

#[async_trait]
impl BackendPort for Base44Client {
    async fn me(&self) -> Result<Value, BackendError> {
        let url = self.app_url("entities/User/me");
        self.send(self.http.get(&url)).await
    }

    async fn update_me(&self, patch: Value) -> Result<Value, BackendError> {
        let url = self.app_url("entities/User/me");
        self.send(self.http.put(&url).json(&patch)).await
    }

    fn login_url(&self, return_to: Option<&str>) -> String {
        let mut url = format!("{}/login?app_id={}", self.config.base_url, self.config.app_id);
        if let Some(return_to) = return_to {
            url.push_str("&from_url=");
            url.push_str(return_to);
        }
        url
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.token.write().await.take();
        tracing::info!("Cleared base44 session token");
        Ok(())
    }

    async fn list(&self, entity: EntityKind, sort: Option<&str>) -> Result<Vec<Value>, BackendError> {
        let req = self.http.get(self.entity_url(entity)).query(&list_params(sort, None));
        tracing::debug!("base44 list {} (sort: {:?})", entity, sort);
        self.send(req).await
    }

    async fn filter(
        &self,
        entity: EntityKind,
        query: Value,
        sort: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, BackendError> {
        let mut params = list_params(sort, limit);
        params.push(("q", query.to_string()));
        let req = self.http.get(self.entity_url(entity)).query(&params);
        tracing::debug!("base44 filter {} {}", entity, query);
        self.send(req).await
    }

    async fn create(&self, entity: EntityKind, record: Value) -> Result<Value, BackendError> {
        let req = self.http.post(self.entity_url(entity)).json(&record);
        self.send(req).await
    }

    async fn update(&self, entity: EntityKind, id: &str, patch: Value) -> Result<Value, BackendError> {
        let url = format!("{}/{}", self.entity_url(entity), id);
        match self.send(self.http.put(&url).json(&patch)).await {
            Err(BackendError::Api { status: 404, .. }) => Err(BackendError::NotFound {
                entity,
                id: id.to_string(),
            }),
            other => other,
        }
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile, BackendError> {
        let url = self.app_url("integration-endpoints/Core/UploadFile");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        tracing::info!("Uploading {} to base44", file_name);
        self.send(self.http.post(&url).multipart(form)).await
    }
}
