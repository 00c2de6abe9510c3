use async_trait::async_trait;
use colored::Colorize;
use shipflow_cloud::{
    ApiResponse, ApplicationRequest, CloudError, CreatedResource, DeployOptions, DeployResult,
    DeploymentSummary, PaasClient, RemoteResource, ServiceRequest, StoreRequest,
};
use shipflow_cloud_paas::{PaasApi, PaasConfig};
use shipflow_config::Settings;
use std::path::Path;

pub async fn handle(file: &Path, dry_run: bool, skip_existing: bool) -> anyhow::Result<bool> {
    let mut settings = Settings::discover()?;
    if skip_existing {
        settings.skip_existing = true;
    }

    let outcome = super::load_source(file)?;
    super::report_diagnostics(&outcome);
    if !outcome.errors.is_empty() {
        eprintln!(
            "{}",
            "✗ 解析エラーがあるためデプロイを中止しました".red().bold()
        );
        return Ok(false);
    }

    let config = settings.deploy_config()?;
    let progress = |message: &str| println!("{message}");
    let options = DeployOptions {
        dry_run,
        progress: Some(&progress),
    };

    let summary = if dry_run {
        println!("{}", "[dry-run] リモートには何も作成しません".yellow());
        shipflow_cloud::deploy(&OfflineClient, &outcome.model, &config, options).await
    } else {
        let missing = settings.missing_for_deploy();
        if !missing.is_empty() {
            eprintln!("{}", "✗ デプロイに必要な設定が不足しています".red().bold());
            for var in missing {
                eprintln!("  - {var}");
            }
            eprintln!();
            eprintln!("環境変数か shipflow.yaml で指定してください");
            return Ok(false);
        }
        let api_url = settings.api_url.clone().unwrap_or_default();
        let api_token = settings.api_token.clone().unwrap_or_default();
        let client = PaasApi::new(PaasConfig::new(api_url, api_token)?)?;
        println!("接続先: {}", client.api_url().cyan());
        shipflow_cloud::deploy(&client, &outcome.model, &config, options).await
    };

    print_summary(&summary);
    Ok(summary.is_success())
}

fn print_summary(summary: &DeploymentSummary) {
    println!();
    for result in &summary.results {
        println!("{}", result_line(result));
    }
    println!();

    let line = format!(
        "作成 {} / スキップ {} / 失敗 {}",
        summary.successful_count, summary.skipped_count, summary.failed_count
    );
    if summary.is_success() {
        println!("{}", format!("✓ {line}").green().bold());
    } else {
        println!("{}", format!("✗ {line}").red().bold());
    }
}

fn result_line(result: &DeployResult) -> String {
    let label = format!("[{}] {}", result.category, result.name);
    match (result.success, result.skipped) {
        (true, true) => format!(
            "  {} {} (既存: {})",
            "↷".yellow(),
            label,
            result.identifier.as_deref().unwrap_or("-")
        ),
        (true, false) => format!(
            "  {} {} ({})",
            "✓".green(),
            label,
            result.identifier.as_deref().unwrap_or("-")
        ),
        (false, _) => format!(
            "  {} {}: {}",
            "✗".red(),
            label,
            result.error.as_deref().unwrap_or("Unknown error")
        ),
    }
}

/// dry-run 用。オーケストレータは dry-run 中にクライアントを呼ばない
struct OfflineClient;

impl OfflineClient {
    fn offline<T>() -> shipflow_cloud::Result<ApiResponse<T>> {
        Err(CloudError::InvalidConfig(
            "dry-run ではリモート API を呼び出せません".to_string(),
        ))
    }
}

#[async_trait]
impl PaasClient for OfflineClient {
    async fn list_stores(&self, _: &str) -> shipflow_cloud::Result<ApiResponse<Vec<RemoteResource>>> {
        Self::offline()
    }

    async fn list_applications(
        &self,
        _: &str,
    ) -> shipflow_cloud::Result<ApiResponse<Vec<RemoteResource>>> {
        Self::offline()
    }

    async fn list_services(
        &self,
        _: &str,
    ) -> shipflow_cloud::Result<ApiResponse<Vec<RemoteResource>>> {
        Self::offline()
    }

    async fn create_postgres(
        &self,
        _: &StoreRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_mysql(
        &self,
        _: &StoreRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_mongo(
        &self,
        _: &StoreRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_redis(
        &self,
        _: &StoreRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_service(
        &self,
        _: &ServiceRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_application_from_private_repo(
        &self,
        _: &ApplicationRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_application_from_repo(
        &self,
        _: &ApplicationRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }

    async fn create_application_from_image(
        &self,
        _: &ApplicationRequest,
    ) -> shipflow_cloud::Result<ApiResponse<CreatedResource>> {
        Self::offline()
    }
}
