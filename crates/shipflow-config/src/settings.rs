//! デプロイ設定
//!
//! YAML ファイルを読み、環境変数で上書きしてから [`DeployConfig`] を組み立てる。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use shipflow_cloud::generator::{API_TOKEN_VAR, API_URL_VAR, ENVIRONMENT_ID_VAR, PROJECT_ID_VAR};
use shipflow_cloud::{DeployConfig, RepositorySource};
use shipflow_core::BuildStrategy;
use std::path::Path;

pub const SERVER_ID_VAR: &str = "SHIPFLOW_SERVER_ID";

/// リポジトリ設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    pub url: String,
    pub branch: Option<String>,
    pub base_path: Option<String>,
    pub private_access_id: Option<String>,
}

/// shipflow.yaml の内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub api_url: Option<String>,
    /// トークンは環境変数からのみ読む
    #[serde(skip)]
    pub api_token: Option<String>,
    pub project_id: Option<String>,
    pub environment_id: Option<String>,
    pub server_id: Option<String>,
    pub instant_deploy: bool,
    pub skip_existing: bool,
    pub build_strategy: Option<String>,
    pub repository: Option<RepositorySettings>,
}

impl Settings {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // 空ファイルは null になるので既定値扱い
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), "設定ファイルを読み込みました");
        Ok(settings)
    }

    /// 設定ファイルを探して読み込み、環境変数で上書きする
    ///
    /// 設定ファイルがなくてもエラーにはしない。
    pub fn discover() -> Result<Self> {
        let mut settings = match crate::find_config_file() {
            Ok(path) => Self::load(&path)?,
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("設定ファイルなし、環境変数のみを使用します");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// プロセスの環境変数で上書き
    pub fn apply_env(&mut self) {
        self.apply_overrides(|var| std::env::var(var).ok());
    }

    /// 空でない値だけがファイルの値を上書きする
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut Option<String>); 5] = [
            (API_URL_VAR, &mut self.api_url),
            (API_TOKEN_VAR, &mut self.api_token),
            (PROJECT_ID_VAR, &mut self.project_id),
            (ENVIRONMENT_ID_VAR, &mut self.environment_id),
            (SERVER_ID_VAR, &mut self.server_id),
        ];
        for (var, slot) in targets {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    pub fn build_strategy(&self) -> Result<Option<BuildStrategy>> {
        match &self.build_strategy {
            None => Ok(None),
            Some(value) => BuildStrategy::parse(value)
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "build_strategy",
                    value: value.clone(),
                }),
        }
    }

    /// 実デプロイに必要で未設定の環境変数名
    pub fn missing_for_deploy(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_url.is_none() {
            missing.push(API_URL_VAR);
        }
        if self.api_token.is_none() {
            missing.push(API_TOKEN_VAR);
        }
        if self.project_id.is_none() {
            missing.push(PROJECT_ID_VAR);
        }
        missing
    }

    /// オーケストレータ用の設定を組み立てる
    ///
    /// プロジェクト ID が未設定なら空文字になる。dry-run 以外では
    /// 呼び出し側が [`Settings::missing_for_deploy`] で先に確認すること。
    pub fn deploy_config(&self) -> Result<DeployConfig> {
        Ok(DeployConfig {
            project_id: self.project_id.clone().unwrap_or_default(),
            environment_id: self.environment_id.clone(),
            server_id: self.server_id.clone(),
            instant_deploy: self.instant_deploy,
            skip_existing: self.skip_existing,
            repository: self.repository.as_ref().map(|r| RepositorySource {
                url: r.url.clone(),
                branch: r.branch.clone(),
                base_path: r.base_path.clone(),
                private_access_id: r.private_access_id.clone(),
            }),
            build_strategy: self.build_strategy()?,
        })
    }
}
