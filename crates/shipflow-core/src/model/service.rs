//! ネットワークサービス定義

use super::store::EnvVar;
use serde::{Deserialize, Serialize};

/// ネットワークサービスの種別
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    #[default]
    Container,
    RabbitMq,
    Kafka,
    Nats,
    Elasticsearch,
    Seq,
    Keycloak,
    /// データストアとして扱う（アセンブラがストア側へ振り替える）
    Garnet,
    /// オブジェクトストレージ（アセンブラがストレージ側へ振り替える）
    Minio,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::RabbitMq => "rabbitmq",
            Self::Kafka => "kafka",
            Self::Nats => "nats",
            Self::Elasticsearch => "elasticsearch",
            Self::Seq => "seq",
            Self::Keycloak => "keycloak",
            Self::Garnet => "garnet",
            Self::Minio => "minio",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ボリュームマウント
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// ボリューム名またはホストパス
    pub name: Option<String>,
    pub mount_path: Option<String>,
    /// WithDataVolume 由来の永続データ領域
    #[serde(default)]
    pub is_data: bool,
}

/// エンドポイントのプロトコル
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProtocol {
    #[default]
    Http,
    Https,
    Tcp,
}

impl EndpointProtocol {
    /// スキーム文字列からパース（不明なものは tcp）
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "http" => Self::Http,
            "https" => Self::Https,
            _ => Self::Tcp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Tcp => "tcp",
        }
    }
}

/// エンドポイント
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub port: Option<u16>,
    pub target_port: Option<u16>,
    pub protocol: EndpointProtocol,
    #[serde(default)]
    pub is_external: bool,
    /// ポート番号を受け取る環境変数名
    pub env_variable: Option<String>,
    pub name: Option<String>,
}

impl Endpoint {
    /// WithExternalHttpEndpoints() のマーカー
    pub fn external_marker() -> Self {
        Self {
            is_external: true,
            ..Default::default()
        }
    }

    /// コンテナ側で実際に待ち受けるポート（targetPort 優先）
    pub fn effective_port(&self) -> Option<u16> {
        self.target_port.or(self.port)
    }
}

/// ネットワークサービス（コンテナ、メッセージブローカー、ストレージ等）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkService {
    pub name: String,
    pub kind: ServiceKind,
    pub variable: Option<String>,
    pub image: Option<String>,
    pub image_tag: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub environment: Vec<EnvVar>,
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub references: Vec<String>,
}

impl NetworkService {
    pub fn new(name: impl Into<String>, kind: ServiceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    /// 外部公開マーカーを持つか
    pub fn is_external(&self) -> bool {
        self.endpoints.iter().any(|e| e.is_external)
    }
}
