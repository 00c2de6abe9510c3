//! デプロイ可能アプリケーション定義

use super::service::Endpoint;
use super::store::EnvVar;
use serde::{Deserialize, Serialize};

/// アプリケーションの種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    #[default]
    Project,
    Node,
    Python,
    Dockerfile,
    Executable,
}

impl AppKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Node => "node",
            Self::Python => "python",
            Self::Dockerfile => "dockerfile",
            Self::Executable => "executable",
        }
    }
}

impl std::fmt::Display for AppKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ビルド方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    #[default]
    Nixpacks,
    Dockerfile,
    Heroku,
    Static,
}

impl BuildStrategy {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nixpacks" => Some(Self::Nixpacks),
            "dockerfile" | "docker" => Some(Self::Dockerfile),
            "heroku" | "heroku_buildpacks" | "buildpacks" => Some(Self::Heroku),
            "static" => Some(Self::Static),
            _ => None,
        }
    }

    /// リモートAPIの buildType 値
    pub fn as_remote_str(&self) -> &'static str {
        match self {
            Self::Nixpacks => "nixpacks",
            Self::Dockerfile => "dockerfile",
            Self::Heroku => "heroku_buildpacks",
            Self::Static => "static",
        }
    }
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_remote_str())
    }
}

/// 明示的な公開モード（PublishAs*）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// PublishAsDockerFile()
    DockerFile,
    /// PublishAsContainer()
    Container,
}

/// デプロイ可能アプリケーション
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    pub kind: AppKind,
    pub variable: Option<String>,
    /// ソースの相対パスまたは絶対パス
    pub source_path: Option<String>,
    /// 型パラメータで指定されたプロジェクトシンボル（例: Projects.Api）
    pub source_identifier: Option<String>,
    pub build_strategy: BuildStrategy,
    pub publish_mode: Option<PublishMode>,
    #[serde(default)]
    pub environment: Vec<EnvVar>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub references: Vec<String>,
    /// WaitFor の宣言順
    #[serde(default)]
    pub wait_for: Vec<String>,
    pub run_script: Option<String>,
    pub install_command: Option<String>,
}

impl Application {
    pub fn new(name: impl Into<String>, kind: AppKind, build_strategy: BuildStrategy) -> Self {
        Self {
            name: name.into(),
            kind,
            build_strategy,
            ..Default::default()
        }
    }

    /// 外部公開マーカーを持つか
    pub fn is_external(&self) -> bool {
        self.endpoints.iter().any(|e| e.is_external)
    }
}
