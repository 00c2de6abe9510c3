//! データストア定義

use serde::{Deserialize, Serialize};

/// データストアの種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// 子ストアや不明なルートメソッドのデフォルト
    #[default]
    Postgres,
    MySql,
    SqlServer,
    MongoDb,
    Redis,
    Valkey,
    Garnet,
    Oracle,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
            Self::MongoDb => "mongodb",
            Self::Redis => "redis",
            Self::Valkey => "valkey",
            Self::Garnet => "garnet",
            Self::Oracle => "oracle",
        }
    }

    /// 参照元アプリに渡す接続文字列の環境変数名
    ///
    /// garnet はこの表に無いので汎用名になる。
    pub fn connection_env_var(&self) -> &'static str {
        CONNECTION_ENV_VARS
            .iter()
            .find(|(kind, _)| *kind == self.as_str())
            .map(|(_, var)| *var)
            .unwrap_or(DEFAULT_CONNECTION_ENV_VAR)
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ストア種別ごとの接続文字列環境変数
const CONNECTION_ENV_VARS: &[(&str, &str)] = &[
    ("postgres", "DATABASE_URL"),
    ("mysql", "MYSQL_URL"),
    ("sqlserver", "SQLSERVER_CONNECTION_STRING"),
    ("mongodb", "MONGODB_URI"),
    ("redis", "REDIS_URL"),
    ("valkey", "REDIS_URL"),
    ("oracle", "ORACLE_CONNECTION_STRING"),
];

pub const DEFAULT_CONNECTION_ENV_VAR: &str = "CONNECTION_STRING";

/// 環境変数エントリ
///
/// `is_expression` が true の値は変数参照なので、リテラルと同じようにクォートしてはいけない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub is_expression: bool,
}

impl EnvVar {
    pub fn literal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_expression: false,
        }
    }

    pub fn expression(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_expression: true,
        }
    }
}

/// データストア
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    pub name: String,
    pub kind: StoreKind,
    /// `var x = ...` で束縛された変数名
    pub variable: Option<String>,
    /// 子ストアの場合の親サーバー名
    pub parent_name: Option<String>,
    /// 子ストアの場合の親サーバー変数名
    pub parent_variable: Option<String>,
    /// AddDatabase の第2引数（物理データベース名）
    pub database_name: Option<String>,
    pub image: Option<String>,
    pub image_tag: Option<String>,
    pub host_port: Option<u16>,
    #[serde(default)]
    pub persistent_volume: bool,
    #[serde(default)]
    pub environment: Vec<EnvVar>,
}

impl DataStore {
    pub fn new(name: impl Into<String>, kind: StoreKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    /// 子ストア（AddDatabase）かどうか
    pub fn is_child(&self) -> bool {
        self.parent_variable.is_some() || self.parent_name.is_some()
    }
}
