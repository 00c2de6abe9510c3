//! Source-side kind to remote-side kind tables

use serde::{Deserialize, Serialize};
use shipflow_core::{ServiceKind, StoreKind};

/// Database families the remote PaaS can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStoreKind {
    Postgres,
    Mysql,
    Mongo,
    Redis,
}

impl RemoteStoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongo => "mongo",
            Self::Redis => "redis",
        }
    }

    /// Create endpoint for this database family
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Postgres => "/postgres.create",
            Self::Mysql => "/mysql.create",
            Self::Mongo => "/mongo.create",
            Self::Redis => "/redis.create",
        }
    }

    /// Image used when the store declares none
    pub fn default_image(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongo => "mongo",
            Self::Redis => "redis",
        }
    }

    pub fn default_tag(&self) -> &'static str {
        match self {
            Self::Postgres => "16",
            Self::Mysql => "8",
            Self::Mongo => "7",
            Self::Redis => "7",
        }
    }

    /// Default superuser, if the engine has one
    pub fn default_user(&self) -> Option<&'static str> {
        match self {
            Self::Postgres => Some("postgres"),
            Self::Mysql => Some("mysql"),
            Self::Mongo => Some("mongo"),
            Self::Redis => None,
        }
    }

    /// Where the engine keeps its data inside the container
    pub fn data_path(&self) -> &'static str {
        match self {
            Self::Postgres => "/var/lib/postgresql/data",
            Self::Mysql => "/var/lib/mysql",
            Self::Mongo => "/data/db",
            Self::Redis => "/data",
        }
    }

    /// Whether the engine takes a database name on creation
    pub fn has_database_name(&self) -> bool {
        !matches!(self, Self::Redis)
    }
}

impl std::fmt::Display for RemoteStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of mapping a store kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMapping {
    pub remote: RemoteStoreKind,
    /// The remote kind stands in for a kind the PaaS does not offer
    pub substituted: bool,
}

// no oracle entry, although oracle has a connection-string variable
const STORE_KINDS: &[(StoreKind, RemoteStoreKind, bool)] = &[
    (StoreKind::Postgres, RemoteStoreKind::Postgres, false),
    (StoreKind::MySql, RemoteStoreKind::Mysql, false),
    (StoreKind::MongoDb, RemoteStoreKind::Mongo, false),
    (StoreKind::Redis, RemoteStoreKind::Redis, false),
    (StoreKind::Valkey, RemoteStoreKind::Redis, false),
    (StoreKind::Garnet, RemoteStoreKind::Redis, false),
    (StoreKind::SqlServer, RemoteStoreKind::Postgres, true),
];

/// Map a store kind to the remote database family
///
/// Returns `None` for kinds the PaaS cannot host at all.
pub fn remote_store_kind(kind: StoreKind) -> Option<StoreMapping> {
    STORE_KINDS
        .iter()
        .find(|(source, _, _)| *source == kind)
        .map(|(_, remote, substituted)| StoreMapping {
            remote: *remote,
            substituted: *substituted,
        })
}

/// Message used wherever a substituted store kind is reported
pub fn substitution_warning(name: &str, kind: StoreKind, remote: RemoteStoreKind) -> String {
    format!("{name}: {kind} is not supported by the remote platform, creating it as {remote}")
}

pub const FALLBACK_SERVICE_TYPE: &str = "docker";

const SERVICE_TYPES: &[(ServiceKind, &str)] = &[
    (ServiceKind::Container, "docker"),
    (ServiceKind::RabbitMq, "rabbitmq"),
    (ServiceKind::Kafka, "kafka"),
    (ServiceKind::Nats, "nats"),
    (ServiceKind::Elasticsearch, "elasticsearch"),
    (ServiceKind::Minio, "minio"),
];

/// Remote service type for a service kind, falling back to a plain container
pub fn remote_service_type(kind: ServiceKind) -> &'static str {
    SERVICE_TYPES
        .iter()
        .find(|(source, _)| *source == kind)
        .map(|(_, remote)| *remote)
        .unwrap_or(FALLBACK_SERVICE_TYPE)
}

const SERVICE_IMAGES: &[(ServiceKind, &str)] = &[
    (ServiceKind::RabbitMq, "rabbitmq:3-management"),
    (ServiceKind::Kafka, "apache/kafka:3.7.0"),
    (ServiceKind::Nats, "nats:2"),
    (
        ServiceKind::Elasticsearch,
        "docker.elastic.co/elasticsearch/elasticsearch:8.13.0",
    ),
    (ServiceKind::Seq, "datalust/seq:latest"),
    (ServiceKind::Keycloak, "quay.io/keycloak/keycloak:24.0"),
    (ServiceKind::Garnet, "ghcr.io/microsoft/garnet:latest"),
    (ServiceKind::Minio, "minio/minio:latest"),
];

/// Image used when a service declares none. Plain containers have no default.
pub fn default_service_image(kind: ServiceKind) -> Option<&'static str> {
    SERVICE_IMAGES
        .iter()
        .find(|(source, _)| *source == kind)
        .map(|(_, image)| *image)
}
