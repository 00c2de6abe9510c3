//! Remote PaaS client abstraction

use crate::error::Result;
use crate::payload::{ApplicationRequest, ServiceRequest, StoreRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Envelope returned by every remote call
///
/// `success: false` is a rejection by the remote system. Transport failures are
/// reported as `Err` by the client instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Collapse the envelope into the result or a readable error message
    ///
    /// A successful envelope without a body still counts as success and yields
    /// `T::default()`.
    pub fn into_result(self) -> std::result::Result<T, String>
    where
        T: Default,
    {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => {
                tracing::warn!("successful response carried no result");
                Ok(T::default())
            }
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}

/// An existing remote resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub name: String,
    pub identifier: String,
}

/// Identifier of a newly created resource
///
/// The identifier is empty when the remote acknowledged the call without a body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub identifier: String,
}

/// Remote PaaS API
///
/// Implementations issue one request per call and never retry. The orchestrator
/// calls them strictly one at a time.
#[async_trait]
pub trait PaasClient: Send + Sync {
    /// Databases already present in the project
    async fn list_stores(&self, project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>>;

    /// Applications already present in the project
    async fn list_applications(
        &self,
        project_id: &str,
    ) -> Result<ApiResponse<Vec<RemoteResource>>>;

    /// Services already present in the project
    async fn list_services(&self, project_id: &str)
    -> Result<ApiResponse<Vec<RemoteResource>>>;

    async fn create_postgres(&self, request: &StoreRequest)
    -> Result<ApiResponse<CreatedResource>>;

    async fn create_mysql(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>>;

    async fn create_mongo(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>>;

    async fn create_redis(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>>;

    async fn create_service(
        &self,
        request: &ServiceRequest,
    ) -> Result<ApiResponse<CreatedResource>>;

    /// Application built from a repository that needs stored credentials
    async fn create_application_from_private_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>>;

    /// Application built from a public repository
    async fn create_application_from_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>>;

    /// Application deployed from a registry image
    async fn create_application_from_image(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>>;
}
