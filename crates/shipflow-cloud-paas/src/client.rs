//! PaaS control-plane HTTP client
//!
//! Every call is a single request with Bearer token authentication. Non-2xx
//! answers are turned into rejections, connection problems into errors.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shipflow_cloud::generator::{API_TOKEN_VAR, API_URL_VAR, APPLICATION_ENDPOINT, SERVICE_ENDPOINT};
use shipflow_cloud::{
    ApiResponse, ApplicationRequest, CloudError, CreatedResource, PaasClient, RemoteResource,
    RemoteStoreKind, Result, ServiceRequest, StoreRequest,
};
use std::time::Duration;

pub const STORES_LIST_ENDPOINT: &str = "/database.all";
pub const APPLICATIONS_LIST_ENDPOINT: &str = "/application.all";
pub const SERVICES_LIST_ENDPOINT: &str = "/service.all";
pub const PRIVATE_REPO_ENDPOINT: &str = "/application.createFromPrivateRepo";
pub const IMAGE_ENDPOINT: &str = "/application.createFromImage";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings
#[derive(Debug, Clone)]
pub struct PaasConfig {
    pub api_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl PaasConfig {
    /// Validate and normalize the settings
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let api_url = api_url.into();
        let api_token = api_token.into();

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(CloudError::InvalidConfig(format!(
                "API URL must start with http:// or https://: {api_url}"
            )));
        }
        if api_token.trim().is_empty() {
            return Err(CloudError::MissingEnvVar(API_TOKEN_VAR.to_string()));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create PaasConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_VAR)
            .map_err(|_| CloudError::MissingEnvVar(API_URL_VAR.to_string()))?;
        let api_token = std::env::var(API_TOKEN_VAR)
            .map_err(|_| CloudError::MissingEnvVar(API_TOKEN_VAR.to_string()))?;
        Self::new(api_url, api_token)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`PaasClient`]
pub struct PaasApi {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl PaasApi {
    pub fn new(config: PaasConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url,
            api_token: config.api_token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    async fn list(&self, endpoint: &str, project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        tracing::debug!(endpoint, project_id, "GET");
        let response = self
            .client
            .get(self.url(endpoint))
            .query(&[("projectId", project_id)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        read(response).await
    }

    async fn create<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<CreatedResource>> {
        tracing::debug!(endpoint, "POST");
        let response = self
            .client
            .post(self.url(endpoint))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        read(response).await
    }
}

fn transport(error: reqwest::Error) -> CloudError {
    if error.is_timeout() {
        CloudError::Timeout(error.to_string())
    } else {
        CloudError::Transport(error.to_string())
    }
}

async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<ApiResponse<T>> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    decode(status, &body)
}

/// Interpret a response body according to its status
fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<ApiResponse<T>> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(CloudError::AuthenticationFailed(format!(
            "HTTP {status}, check {API_TOKEN_VAR}"
        )));
    }
    if status.is_success() {
        return Ok(serde_json::from_str(body)?);
    }

    match serde_json::from_str::<ApiResponse<T>>(body) {
        Ok(response) if !response.success => Ok(response),
        _ => {
            let body = body.trim();
            if body.is_empty() {
                Ok(ApiResponse::rejected(format!("HTTP {status}")))
            } else {
                Ok(ApiResponse::rejected(format!("HTTP {status}: {body}")))
            }
        }
    }
}

#[async_trait]
impl PaasClient for PaasApi {
    async fn list_stores(&self, project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list(STORES_LIST_ENDPOINT, project_id).await
    }

    async fn list_applications(
        &self,
        project_id: &str,
    ) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list(APPLICATIONS_LIST_ENDPOINT, project_id).await
    }

    async fn list_services(&self, project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list(SERVICES_LIST_ENDPOINT, project_id).await
    }

    async fn create_postgres(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create(RemoteStoreKind::Postgres.endpoint(), request).await
    }

    async fn create_mysql(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create(RemoteStoreKind::Mysql.endpoint(), request).await
    }

    async fn create_mongo(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create(RemoteStoreKind::Mongo.endpoint(), request).await
    }

    async fn create_redis(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create(RemoteStoreKind::Redis.endpoint(), request).await
    }

    async fn create_service(&self, request: &ServiceRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create(SERVICE_ENDPOINT, request).await
    }

    async fn create_application_from_private_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create(PRIVATE_REPO_ENDPOINT, request).await
    }

    async fn create_application_from_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create(APPLICATION_ENDPOINT, request).await
    }

    async fn create_application_from_image(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create(IMAGE_ENDPOINT, request).await
    }
}
