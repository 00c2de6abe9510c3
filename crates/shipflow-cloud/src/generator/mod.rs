//! Operation generation
//!
//! Maps an assembled [`AppModel`] to the list of remote create calls that would
//! reproduce it, and renders those calls as a standalone shell script.
//!
//! Generation is per resource: a resource that cannot be mapped is reported in
//! [`GenerationResult::errors`] and the rest of the batch is still produced.

mod application;
mod script;
mod service;
mod store;

pub use application::APPLICATION_ENDPOINT;
pub use script::{API_TOKEN_VAR, API_URL_VAR, render_script};
pub use service::SERVICE_ENDPOINT;

use crate::error::GenerateError;
use crate::payload::PayloadContext;
use serde::Serialize;
use shipflow_core::{AppModel, ResourceCategory};

pub const PROJECT_ID_VAR: &str = "SHIPFLOW_PROJECT_ID";
pub const ENVIRONMENT_ID_VAR: &str = "SHIPFLOW_ENVIRONMENT_ID";

/// Options for [`generate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub project_id: Option<String>,
    pub environment_id: Option<String>,
    pub server_id: Option<String>,
    /// Emit `#` comment lines in the rendered script
    pub include_comments: bool,
    pub instant_deploy: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            environment_id: None,
            server_id: None,
            include_comments: true,
            instant_deploy: false,
        }
    }
}

impl GenerateOptions {
    /// Identifiers for the payloads; missing ones become script placeholders
    pub fn payload_context(&self) -> PayloadContext {
        PayloadContext {
            project_id: self
                .project_id
                .clone()
                .unwrap_or_else(|| placeholder(PROJECT_ID_VAR)),
            environment_id: Some(
                self.environment_id
                    .clone()
                    .unwrap_or_else(|| placeholder(ENVIRONMENT_ID_VAR)),
            ),
            server_id: self.server_id.clone(),
            instant_deploy: self.instant_deploy,
        }
    }

    /// Environment variables the rendered script needs at run time
    pub fn required_variables(&self) -> Vec<&'static str> {
        let mut vars = vec![API_URL_VAR, API_TOKEN_VAR];
        if self.project_id.is_none() {
            vars.push(PROJECT_ID_VAR);
        }
        if self.environment_id.is_none() {
            vars.push(ENVIRONMENT_ID_VAR);
        }
        vars
    }
}

/// `${NAME}` as it appears in payloads
pub fn placeholder(var: &str) -> String {
    format!("${{{var}}}")
}

/// One remote create call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub endpoint: String,
    pub method: String,
    pub payload: serde_json::Value,
    pub display_name: String,
    pub category: ResourceCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Operation {
    fn post(
        endpoint: &str,
        payload: serde_json::Value,
        display_name: &str,
        category: ResourceCategory,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            method: "POST".to_string(),
            payload,
            display_name: display_name.to_string(),
            category,
            annotation: None,
        }
    }

    fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

/// Output of [`generate`]
#[derive(Debug, Default)]
pub struct GenerationResult {
    pub operations: Vec<Operation>,
    pub script: String,
    pub errors: Vec<GenerateError>,
    /// Kind substitutions the platform forced
    pub warnings: Vec<String>,
}

impl GenerationResult {
    fn push(&mut self, operation: Result<Operation, GenerateError>) {
        match operation {
            Ok(operation) => self.operations.push(operation),
            Err(error) => {
                tracing::warn!(%error, "skipping resource");
                self.errors.push(error);
            }
        }
    }
}

fn to_payload<T: Serialize>(name: &str, request: &T) -> Result<serde_json::Value, GenerateError> {
    serde_json::to_value(request).map_err(|source| GenerateError::Payload {
        name: name.to_string(),
        source,
    })
}

/// Generate the operations and script for a model
///
/// Order is fixed: stores, storage services, services, then applications.
pub fn generate(model: &AppModel, options: &GenerateOptions) -> GenerationResult {
    let ctx = options.payload_context();
    let mut result = GenerationResult::default();

    for store in &model.stores {
        let operation = store::store_operation(store, &ctx, &mut result.warnings);
        result.push(operation);
    }
    for service in &model.storage_services {
        result.push(service::service_operation(
            service,
            ResourceCategory::Storage,
            &ctx,
        ));
    }
    for service in &model.services {
        result.push(service::service_operation(
            service,
            ResourceCategory::Service,
            &ctx,
        ));
    }
    for app in &model.applications {
        result.push(application::application_operation(
            app,
            model.references_from(&app.name),
            &ctx,
        ));
    }

    result.script = render_script(&result.operations, options);
    tracing::debug!(
        operations = result.operations.len(),
        errors = result.errors.len(),
        "generated operations"
    );
    result
}
