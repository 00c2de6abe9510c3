//! Deployment orchestration
//!
//! Creates every resource of an [`AppModel`] on the remote PaaS, one call at a
//! time in the fixed category order. A failing resource is recorded and the run
//! moves on; nothing here returns early.

use crate::client::{ApiResponse, CreatedResource, PaasClient, RemoteResource};
use crate::error::CloudError;
use crate::payload::{
    PayloadContext, application_request, base_directory, service_request, store_request,
};
use crate::remap::{RemoteStoreKind, remote_store_kind, substitution_warning};
use serde::{Deserialize, Serialize};
use shipflow_core::{
    AppModel, Application, BuildStrategy, DataStore, NetworkService, ResourceCategory,
};
use std::collections::HashMap;

/// Source repository for applications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySource {
    pub url: String,
    pub branch: Option<String>,
    /// Directory inside the repository that the AppHost paths are relative to
    pub base_path: Option<String>,
    /// Stored credential for private repositories
    pub private_access_id: Option<String>,
}

/// Where and how to deploy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployConfig {
    pub project_id: String,
    pub environment_id: Option<String>,
    pub server_id: Option<String>,
    pub instant_deploy: bool,
    /// Treat resources that already exist remotely as done
    pub skip_existing: bool,
    pub repository: Option<RepositorySource>,
    /// Overrides every application's own build strategy
    pub build_strategy: Option<BuildStrategy>,
}

impl DeployConfig {
    fn payload_context(&self) -> PayloadContext {
        PayloadContext {
            project_id: self.project_id.clone(),
            environment_id: self.environment_id.clone(),
            server_id: self.server_id.clone(),
            instant_deploy: self.instant_deploy,
        }
    }
}

/// Receives human-readable progress lines
///
/// Lines are advisory. Use [`DeploymentSummary`] for anything that matters.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Default sink: progress goes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

#[derive(Default, Clone, Copy)]
pub struct DeployOptions<'a> {
    /// Produce the full result list without any remote call
    pub dry_run: bool,
    pub progress: Option<&'a dyn ProgressSink>,
}

/// Outcome for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub success: bool,
    pub category: ResourceCategory,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub results: Vec<DeployResult>,
    /// Created resources. Skipped ones are not counted here.
    pub successful_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
}

impl DeploymentSummary {
    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }

    pub fn add_success(&mut self, category: ResourceCategory, name: &str, identifier: String) {
        self.successful_count += 1;
        self.results.push(DeployResult {
            success: true,
            category,
            name: name.to_string(),
            identifier: Some(identifier),
            error: None,
            skipped: false,
        });
    }

    pub fn add_skipped(&mut self, category: ResourceCategory, name: &str, identifier: String) {
        self.skipped_count += 1;
        self.results.push(DeployResult {
            success: true,
            category,
            name: name.to_string(),
            identifier: Some(identifier),
            error: None,
            skipped: true,
        });
    }

    pub fn add_failure(&mut self, category: ResourceCategory, name: &str, error: String) {
        self.failed_count += 1;
        self.results.push(DeployResult {
            success: false,
            category,
            name: name.to_string(),
            identifier: None,
            error: Some(error),
            skipped: false,
        });
    }

    /// Results in one category, in deployment order
    pub fn by_category(&self, category: ResourceCategory) -> impl Iterator<Item = &DeployResult> {
        self.results.iter().filter(move |r| r.category == category)
    }
}

impl std::fmt::Display for DeploymentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} skipped, {} failed",
            self.successful_count, self.skipped_count, self.failed_count
        )
    }
}

/// Name to identifier maps of what already exists remotely
#[derive(Debug, Default)]
struct Inventory {
    stores: HashMap<String, String>,
    applications: HashMap<String, String>,
    services: HashMap<String, String>,
}

impl Inventory {
    async fn fetch<C: PaasClient + ?Sized>(
        client: &C,
        project_id: &str,
        progress: &dyn ProgressSink,
    ) -> Self {
        let stores = client.list_stores(project_id).await;
        let applications = client.list_applications(project_id).await;
        let services = client.list_services(project_id).await;

        Self {
            stores: inventory_map("stores", stores, progress),
            applications: inventory_map("applications", applications, progress),
            services: inventory_map("services", services, progress),
        }
    }

    fn for_category(&self, category: ResourceCategory) -> &HashMap<String, String> {
        match category {
            ResourceCategory::Store => &self.stores,
            // storage services live in the services inventory
            ResourceCategory::Storage | ResourceCategory::Service => &self.services,
            ResourceCategory::Application => &self.applications,
        }
    }
}

/// A failed listing is reported and treated as an empty inventory
fn inventory_map(
    what: &str,
    response: Result<ApiResponse<Vec<RemoteResource>>, CloudError>,
    progress: &dyn ProgressSink,
) -> HashMap<String, String> {
    let listed = response
        .map_err(|e| e.to_string())
        .and_then(ApiResponse::into_result);

    match listed {
        Ok(resources) => resources
            .into_iter()
            .map(|r| (r.name, r.identifier))
            .collect(),
        Err(error) => {
            tracing::warn!(what, %error, "inventory listing failed, assuming empty");
            progress.report(&format!("Could not list remote {what}: {error}"));
            HashMap::new()
        }
    }
}

fn settle(response: Result<ApiResponse<CreatedResource>, CloudError>) -> Result<String, String> {
    match response {
        Ok(response) => response.into_result().map(|created| created.identifier),
        Err(error) => Err(error.to_string()),
    }
}

/// What to do about one resource before any create call
enum Precheck {
    Create,
    Done,
}

/// Dry run and existence handling shared by every category
fn precheck(
    summary: &mut DeploymentSummary,
    inventory: &Inventory,
    category: ResourceCategory,
    name: &str,
    config: &DeployConfig,
    dry_run: bool,
    progress: &dyn ProgressSink,
) -> Precheck {
    progress.report(&format!("Creating {category} '{name}'..."));

    if dry_run {
        summary.add_success(category, name, format!("dry-run-{name}"));
        progress.report(&format!("  [dry-run] {category} '{name}' would be created"));
        return Precheck::Done;
    }

    let Some(existing) = inventory.for_category(category).get(name) else {
        return Precheck::Create;
    };
    if config.skip_existing {
        summary.add_skipped(category, name, existing.clone());
        progress.report(&format!("  skipped {category} '{name}': already exists ({existing})"));
    } else {
        summary.add_failure(
            category,
            name,
            format!("{category} '{name}' already exists ({existing})"),
        );
        progress.report(&format!("  failed {category} '{name}': already exists"));
    }
    Precheck::Done
}

fn record(
    summary: &mut DeploymentSummary,
    category: ResourceCategory,
    name: &str,
    outcome: Result<String, String>,
    progress: &dyn ProgressSink,
) {
    match outcome {
        Ok(identifier) => {
            progress.report(&format!("  created {category} '{name}' ({identifier})"));
            summary.add_success(category, name, identifier);
        }
        Err(error) => {
            tracing::warn!(%category, name, %error, "create failed");
            progress.report(&format!("  failed {category} '{name}': {error}"));
            summary.add_failure(category, name, error);
        }
    }
}

async fn create_store<C: PaasClient + ?Sized>(
    client: &C,
    store: &DataStore,
    ctx: &PayloadContext,
    progress: &dyn ProgressSink,
) -> Result<String, String> {
    let Some(mapping) = remote_store_kind(store.kind) else {
        return Err(format!(
            "unsupported store kind '{}' for '{}'",
            store.kind, store.name
        ));
    };
    if mapping.substituted {
        let warning = substitution_warning(&store.name, store.kind, mapping.remote);
        tracing::warn!("{}", warning);
        progress.report(&format!("  warning: {warning}"));
    }

    let request = store_request(store, mapping, ctx);
    let response = match mapping.remote {
        RemoteStoreKind::Postgres => client.create_postgres(&request).await,
        RemoteStoreKind::Mysql => client.create_mysql(&request).await,
        RemoteStoreKind::Mongo => client.create_mongo(&request).await,
        RemoteStoreKind::Redis => client.create_redis(&request).await,
    };
    settle(response)
}

async fn create_service<C: PaasClient + ?Sized>(
    client: &C,
    service: &NetworkService,
    ctx: &PayloadContext,
) -> Result<String, String> {
    settle(client.create_service(&service_request(service, ctx)).await)
}

async fn create_application<C: PaasClient + ?Sized>(
    client: &C,
    app: &Application,
    model: &AppModel,
    config: &DeployConfig,
    ctx: &PayloadContext,
) -> Result<String, String> {
    let build_strategy = config.build_strategy.unwrap_or(app.build_strategy);
    let mut request =
        application_request(app, model.references_from(&app.name), build_strategy, ctx);

    let response = match &config.repository {
        Some(repository) => {
            request.repository = Some(repository.url.clone());
            request.branch = repository.branch.clone();
            request.build_path =
                base_directory(repository.base_path.as_deref(), app.source_path.as_deref());

            match &repository.private_access_id {
                Some(access_id) => {
                    request.private_access_id = Some(access_id.clone());
                    client.create_application_from_private_repo(&request).await
                }
                None => client.create_application_from_repo(&request).await,
            }
        }
        None => {
            let image = app
                .source_identifier
                .as_deref()
                .unwrap_or(&app.name)
                .to_lowercase();
            request.docker_image = Some(image);
            client.create_application_from_image(&request).await
        }
    };
    settle(response)
}

/// Deploy a model
///
/// Never fails as a whole: every per-resource problem, including transport
/// errors, ends up in the returned summary.
pub async fn deploy<C: PaasClient + ?Sized>(
    client: &C,
    model: &AppModel,
    config: &DeployConfig,
    options: DeployOptions<'_>,
) -> DeploymentSummary {
    let progress: &dyn ProgressSink = options.progress.unwrap_or(&TracingProgress);
    let dry_run = options.dry_run;
    let ctx = config.payload_context();
    let mut summary = DeploymentSummary::default();

    let inventory = if dry_run {
        progress.report("Dry run: no remote calls will be made");
        Inventory::default()
    } else {
        progress.report("Fetching remote inventory...");
        Inventory::fetch(client, &config.project_id, progress).await
    };

    for store in &model.stores {
        let category = ResourceCategory::Store;
        if let Precheck::Create = precheck(
            &mut summary,
            &inventory,
            category,
            &store.name,
            config,
            dry_run,
            progress,
        ) {
            let outcome = create_store(client, store, &ctx, progress).await;
            record(&mut summary, category, &store.name, outcome, progress);
        }
    }

    let services = model
        .storage_services
        .iter()
        .map(|s| (ResourceCategory::Storage, s))
        .chain(
            model
                .services
                .iter()
                .map(|s| (ResourceCategory::Service, s)),
        );
    for (category, service) in services {
        if let Precheck::Create = precheck(
            &mut summary,
            &inventory,
            category,
            &service.name,
            config,
            dry_run,
            progress,
        ) {
            let outcome = create_service(client, service, &ctx).await;
            record(&mut summary, category, &service.name, outcome, progress);
        }
    }

    for app in &model.applications {
        let category = ResourceCategory::Application;
        if let Precheck::Create = precheck(
            &mut summary,
            &inventory,
            category,
            &app.name,
            config,
            dry_run,
            progress,
        ) {
            let outcome = create_application(client, app, model, config, &ctx).await;
            record(&mut summary, category, &app.name, outcome, progress);
        }
    }

    progress.report(&format!("Deployment finished: {summary}"));
    summary
}
