use async_trait::async_trait;
use shipflow_cloud::{
    ApiResponse, ApplicationRequest, CloudError, CreatedResource, DeployConfig, DeployOptions,
    PaasClient, RemoteResource, RepositorySource, Result, ServiceRequest, StoreRequest, deploy,
};
use shipflow_core::{
    AppKind, AppModel, Application, BuildStrategy, DataStore, NetworkService, ResourceCategory,
    ServiceKind, StoreKind, parse_source,
};
use std::sync::Mutex;

/// Records every call and answers from canned data
#[derive(Default)]
struct RecordingClient {
    calls: Mutex<Vec<String>>,
    app_requests: Mutex<Vec<ApplicationRequest>>,
    existing_stores: Vec<RemoteResource>,
    existing_services: Vec<RemoteResource>,
    /// Names whose create call is rejected by the remote side
    reject: Vec<String>,
    /// Names whose create call fails in transport
    unreachable: Vec<String>,
    fail_listing: bool,
}

impl RecordingClient {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn create_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_"))
            .collect()
    }

    fn list(&self, what: &str, existing: &[RemoteResource]) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.calls.lock().unwrap().push(format!("list_{what}"));
        if self.fail_listing {
            return Err(CloudError::Transport("connection refused".into()));
        }
        Ok(ApiResponse::ok(existing.to_vec()))
    }

    fn create(&self, call: &str, name: &str) -> Result<ApiResponse<CreatedResource>> {
        self.calls.lock().unwrap().push(format!("{call}:{name}"));
        if self.unreachable.iter().any(|n| n == name) {
            return Err(CloudError::Transport("connection reset".into()));
        }
        if self.reject.iter().any(|n| n == name) {
            return Ok(ApiResponse::rejected(format!("{name} rejected")));
        }
        Ok(ApiResponse::ok(CreatedResource {
            identifier: format!("id-{name}"),
        }))
    }

    fn create_app(&self, call: &str, request: &ApplicationRequest) -> Result<ApiResponse<CreatedResource>> {
        self.app_requests.lock().unwrap().push(request.clone());
        self.create(call, &request.name)
    }
}

#[async_trait]
impl PaasClient for RecordingClient {
    async fn list_stores(&self, _project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list("stores", &self.existing_stores)
    }

    async fn list_applications(&self, _project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list("applications", &[])
    }

    async fn list_services(&self, _project_id: &str) -> Result<ApiResponse<Vec<RemoteResource>>> {
        self.list("services", &self.existing_services)
    }

    async fn create_postgres(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create("postgres", &request.name)
    }

    async fn create_mysql(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create("mysql", &request.name)
    }

    async fn create_mongo(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create("mongo", &request.name)
    }

    async fn create_redis(&self, request: &StoreRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create("redis", &request.name)
    }

    async fn create_service(&self, request: &ServiceRequest) -> Result<ApiResponse<CreatedResource>> {
        self.create("service", &request.name)
    }

    async fn create_application_from_private_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create_app("app_private_repo", request)
    }

    async fn create_application_from_repo(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create_app("app_repo", request)
    }

    async fn create_application_from_image(
        &self,
        request: &ApplicationRequest,
    ) -> Result<ApiResponse<CreatedResource>> {
        self.create_app("app_image", request)
    }
}

fn config() -> DeployConfig {
    DeployConfig {
        project_id: "proj".into(),
        ..Default::default()
    }
}

fn sample_model() -> AppModel {
    let mut api = Application::new("api", AppKind::Project, BuildStrategy::Dockerfile);
    api.source_identifier = Some("Projects.Api".into());
    api.source_path = Some("./src/api".into());

    AppModel {
        stores: vec![
            DataStore::new("db", StoreKind::Postgres),
            DataStore::new("cache", StoreKind::Redis),
        ],
        services: vec![NetworkService::new("mq", ServiceKind::RabbitMq)],
        storage_services: vec![NetworkService::new("blobs", ServiceKind::Minio)],
        applications: vec![api],
        references: vec![],
    }
}

fn resource(name: &str) -> RemoteResource {
    RemoteResource {
        name: name.into(),
        identifier: format!("remote-{name}"),
    }
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    let client = RecordingClient::default();
    let summary = deploy(
        &client,
        &sample_model(),
        &config(),
        DeployOptions {
            dry_run: true,
            ..Default::default()
        },
    )
    .await;

    assert!(client.calls().is_empty());
    assert_eq!(summary.results.len(), 5);
    assert!(summary.results.iter().all(|r| r.success));
    assert_eq!(summary.results[0].identifier.as_deref(), Some("dry-run-db"));
    assert_eq!(summary.successful_count, 5);
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_deployment_order_and_dispatch() {
    let client = RecordingClient::default();
    let summary = deploy(&client, &sample_model(), &config(), DeployOptions::default()).await;

    assert_eq!(
        client.calls(),
        vec![
            "list_stores",
            "list_applications",
            "list_services",
            "postgres:db",
            "redis:cache",
            "service:blobs",
            "service:mq",
            "app_image:api",
        ]
    );
    assert_eq!(summary.successful_count, 5);
    assert_eq!(summary.results[0].identifier.as_deref(), Some("id-db"));

    let categories: Vec<ResourceCategory> = summary.results.iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec![
            ResourceCategory::Store,
            ResourceCategory::Store,
            ResourceCategory::Storage,
            ResourceCategory::Service,
            ResourceCategory::Application,
        ]
    );
}

#[tokio::test]
async fn test_existing_resources_are_skipped() {
    let client = RecordingClient {
        existing_stores: vec![resource("db")],
        existing_services: vec![resource("blobs")],
        ..Default::default()
    };
    let config = DeployConfig {
        skip_existing: true,
        ..config()
    };

    let summary = deploy(&client, &sample_model(), &config, DeployOptions::default()).await;

    assert!(!client.create_calls().contains(&"postgres:db".to_string()));
    assert!(!client.create_calls().contains(&"service:blobs".to_string()));
    assert_eq!(summary.skipped_count, 2);
    assert_eq!(summary.successful_count, 3);
    assert_eq!(summary.failed_count, 0);

    let db = &summary.results[0];
    assert!(db.success && db.skipped);
    assert_eq!(db.identifier.as_deref(), Some("remote-db"));
}

#[tokio::test]
async fn test_existing_resources_fail_without_skip() {
    let client = RecordingClient {
        existing_stores: vec![resource("db")],
        ..Default::default()
    };

    let summary = deploy(&client, &sample_model(), &config(), DeployOptions::default()).await;

    assert!(!client.create_calls().contains(&"postgres:db".to_string()));
    let db = &summary.results[0];
    assert!(!db.success);
    assert!(db.error.as_deref().is_some_and(|e| e.contains("already exists")));
    // the rest still deploys
    assert_eq!(summary.successful_count, 4);
    assert_eq!(summary.failed_count, 1);
}

#[tokio::test]
async fn test_unsupported_store_fails_without_call() {
    let model = AppModel {
        stores: vec![DataStore::new("legacy", StoreKind::Oracle)],
        ..Default::default()
    };
    let client = RecordingClient::default();

    let summary = deploy(&client, &model, &config(), DeployOptions::default()).await;

    assert!(client.create_calls().is_empty());
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.failed_count, 1);
    assert!(
        summary.results[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("oracle"))
    );
}

#[tokio::test]
async fn test_sqlserver_is_created_as_postgres() {
    let model = AppModel {
        stores: vec![DataStore::new("sql", StoreKind::SqlServer)],
        ..Default::default()
    };
    let client = RecordingClient::default();
    let messages = Mutex::new(Vec::<String>::new());
    let sink = |m: &str| messages.lock().unwrap().push(m.to_string());

    let summary = deploy(
        &client,
        &model,
        &config(),
        DeployOptions {
            progress: Some(&sink),
            ..Default::default()
        },
    )
    .await;

    assert_eq!(client.create_calls(), vec!["postgres:sql"]);
    assert!(summary.is_success());
    assert!(
        messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains("sqlserver") && m.contains("postgres"))
    );
}

#[tokio::test]
async fn test_failures_do_not_stop_the_run() {
    let client = RecordingClient {
        reject: vec!["cache".into()],
        unreachable: vec!["mq".into()],
        ..Default::default()
    };

    let summary = deploy(&client, &sample_model(), &config(), DeployOptions::default()).await;

    assert_eq!(client.create_calls().len(), 5);
    assert_eq!(summary.failed_count, 2);
    assert_eq!(summary.successful_count, 3);
    assert!(!summary.is_success());

    let cache = &summary.results[1];
    assert_eq!(cache.name, "cache");
    assert_eq!(cache.error.as_deref(), Some("cache rejected"));

    let mq = summary
        .by_category(ResourceCategory::Service)
        .next()
        .unwrap();
    assert!(mq.error.as_deref().is_some_and(|e| e.contains("connection reset")));
}

#[tokio::test]
async fn test_inventory_failure_is_treated_as_empty() {
    let client = RecordingClient {
        existing_stores: vec![resource("db")],
        fail_listing: true,
        ..Default::default()
    };
    let config = DeployConfig {
        skip_existing: true,
        ..config()
    };

    let summary = deploy(&client, &sample_model(), &config, DeployOptions::default()).await;

    assert!(client.create_calls().contains(&"postgres:db".to_string()));
    assert_eq!(summary.skipped_count, 0);
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_application_from_public_repository() {
    let client = RecordingClient::default();
    let config = DeployConfig {
        repository: Some(RepositorySource {
            url: "https://github.com/acme/shop".into(),
            branch: Some("main".into()),
            base_path: Some("services".into()),
            private_access_id: None,
        }),
        build_strategy: Some(BuildStrategy::Nixpacks),
        ..config()
    };

    deploy(&client, &sample_model(), &config, DeployOptions::default()).await;

    assert!(client.calls().contains(&"app_repo:api".to_string()));
    let requests = client.app_requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.repository.as_deref(), Some("https://github.com/acme/shop"));
    assert_eq!(request.branch.as_deref(), Some("main"));
    assert_eq!(request.build_path.as_deref(), Some("services/src/api"));
    assert_eq!(request.build_type, "nixpacks");
    assert_eq!(request.private_access_id, None);
}

#[tokio::test]
async fn test_application_from_private_repository() {
    let client = RecordingClient::default();
    let config = DeployConfig {
        repository: Some(RepositorySource {
            url: "git@github.com:acme/shop.git".into(),
            private_access_id: Some("key-1".into()),
            ..Default::default()
        }),
        ..config()
    };

    deploy(&client, &sample_model(), &config, DeployOptions::default()).await;

    assert!(client.calls().contains(&"app_private_repo:api".to_string()));
    let requests = client.app_requests.lock().unwrap();
    assert_eq!(requests[0].private_access_id.as_deref(), Some("key-1"));
    assert_eq!(requests[0].build_type, "dockerfile");
}

#[tokio::test]
async fn test_application_from_image_uses_source_identifier() {
    let mut model = sample_model();
    model
        .applications
        .push(Application::new("worker", AppKind::Executable, BuildStrategy::Nixpacks));
    let client = RecordingClient::default();

    deploy(&client, &model, &config(), DeployOptions::default()).await;

    let requests = client.app_requests.lock().unwrap();
    assert_eq!(requests[0].docker_image.as_deref(), Some("projects.api"));
    assert_eq!(requests[1].docker_image.as_deref(), Some("worker"));
    assert_eq!(requests[0].repository, None);
}

#[tokio::test]
async fn test_end_to_end_deploy() {
    let source = r#"
        var builder = DistributedApplication.CreateBuilder(args);
        var mydb = builder.AddPostgres("mydb").WithHostPort(5432);
        builder.AddNpmApp("webapp", "../webapp").WithReference(mydb);
        builder.Build().Run();
    "#;
    let outcome = parse_source(source);
    assert!(outcome.is_clean());

    let client = RecordingClient::default();
    let summary = deploy(&client, &outcome.model, &config(), DeployOptions::default()).await;

    assert_eq!(client.create_calls(), vec!["postgres:mydb", "app_image:webapp"]);
    assert_eq!(summary.successful_count, 2);

    let requests = client.app_requests.lock().unwrap();
    assert_eq!(requests[0].env, "DATABASE_URL=${{mydb.DATABASE_URL}}");
    assert_eq!(requests[0].project_id, "proj");
}
