//! アセンブル済みアプリケーションモデル

use super::application::Application;
use super::service::NetworkService;
use super::store::DataStore;
use serde::{Deserialize, Serialize};

/// リソースのカテゴリ
///
/// 並び順はそのまま生成・デプロイ順になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Store,
    Storage,
    Service,
    Application,
}

impl ResourceCategory {
    /// 生成・デプロイの固定順
    pub const ORDER: [ResourceCategory; 4] = [
        ResourceCategory::Store,
        ResourceCategory::Storage,
        ResourceCategory::Service,
        ResourceCategory::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Storage => "storage",
            Self::Service => "service",
            Self::Application => "application",
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 参照エッジ（アプリ/サービス → 依存先）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEdge {
    pub from: String,
    pub to: String,
    /// 依存先がデータストアの場合のみ
    pub connection_string_env_var: Option<String>,
}

/// AppModel - ソースから組み立てたデプロイ対象の全体像
///
/// パース時に一度だけ作られ、以後は読み取り専用。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppModel {
    pub stores: Vec<DataStore>,
    pub services: Vec<NetworkService>,
    pub storage_services: Vec<NetworkService>,
    pub applications: Vec<Application>,
    pub references: Vec<ReferenceEdge>,
}

impl AppModel {
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
            && self.services.is_empty()
            && self.storage_services.is_empty()
            && self.applications.is_empty()
    }

    /// 全リソース数
    pub fn resource_count(&self) -> usize {
        self.stores.len()
            + self.services.len()
            + self.storage_services.len()
            + self.applications.len()
    }

    /// カテゴリ順に (カテゴリ, 名前) を列挙
    pub fn resource_names(&self) -> Vec<(ResourceCategory, &str)> {
        let mut names = Vec::with_capacity(self.resource_count());
        names.extend(
            self.stores
                .iter()
                .map(|s| (ResourceCategory::Store, s.name.as_str())),
        );
        names.extend(
            self.storage_services
                .iter()
                .map(|s| (ResourceCategory::Storage, s.name.as_str())),
        );
        names.extend(
            self.services
                .iter()
                .map(|s| (ResourceCategory::Service, s.name.as_str())),
        );
        names.extend(
            self.applications
                .iter()
                .map(|a| (ResourceCategory::Application, a.name.as_str())),
        );
        names
    }

    /// 指定リソースから出ている参照エッジ
    pub fn references_from<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ReferenceEdge> {
        self.references.iter().filter(move |r| r.from == name)
    }
}
