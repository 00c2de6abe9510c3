//! モデル定義
//!
//! AppHost ソースから抽出したリソースのデータモデルを定義します。
//! 各モデルはカテゴリごとにモジュールに分離されています。

mod app_model;
mod application;
mod service;
mod store;

// Re-exports
pub use app_model::*;
pub use application::*;
pub use service::*;
pub use store::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_env_var_table() {
        assert_eq!(StoreKind::Postgres.connection_env_var(), "DATABASE_URL");
        assert_eq!(StoreKind::MySql.connection_env_var(), "MYSQL_URL");
        assert_eq!(StoreKind::MongoDb.connection_env_var(), "MONGODB_URI");
        assert_eq!(StoreKind::Redis.connection_env_var(), "REDIS_URL");
        assert_eq!(StoreKind::Valkey.connection_env_var(), "REDIS_URL");
        assert_eq!(
            StoreKind::Oracle.connection_env_var(),
            "ORACLE_CONNECTION_STRING"
        );
        // garnet は表に無いので汎用名
        assert_eq!(
            StoreKind::Garnet.connection_env_var(),
            DEFAULT_CONNECTION_ENV_VAR
        );
    }

    #[test]
    fn test_resource_names_follow_category_order() {
        let model = AppModel {
            applications: vec![Application::new(
                "web",
                AppKind::Node,
                BuildStrategy::Nixpacks,
            )],
            services: vec![NetworkService::new("mq", ServiceKind::RabbitMq)],
            storage_services: vec![NetworkService::new("blobs", ServiceKind::Minio)],
            stores: vec![DataStore::new("db", StoreKind::Postgres)],
            references: vec![],
        };

        let names = model.resource_names();
        assert_eq!(
            names,
            vec![
                (ResourceCategory::Store, "db"),
                (ResourceCategory::Storage, "blobs"),
                (ResourceCategory::Service, "mq"),
                (ResourceCategory::Application, "web"),
            ]
        );
        assert_eq!(model.resource_count(), 4);
    }

    #[test]
    fn test_empty_model() {
        let model = AppModel::default();
        assert!(model.is_empty());
        assert_eq!(model.resource_count(), 0);
    }

    #[test]
    fn test_model_serializes_camel_case() {
        let mut store = DataStore::new("db", StoreKind::Postgres);
        store.host_port = Some(5432);
        store.environment.push(EnvVar::expression("PASS", "password"));

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["hostPort"], 5432);
        assert_eq!(json["kind"], "postgres");
        assert_eq!(json["environment"][0]["isExpression"], true);
    }

    #[test]
    fn test_endpoint_effective_port_prefers_target() {
        let endpoint = Endpoint {
            port: Some(80),
            target_port: Some(8080),
            ..Default::default()
        };
        assert_eq!(endpoint.effective_port(), Some(8080));
        assert_eq!(Endpoint::external_marker().effective_port(), None);
    }

    #[test]
    fn test_build_strategy_parse() {
        assert_eq!(
            BuildStrategy::parse("Dockerfile"),
            Some(BuildStrategy::Dockerfile)
        );
        assert_eq!(
            BuildStrategy::parse("buildpacks"),
            Some(BuildStrategy::Heroku)
        );
        assert_eq!(BuildStrategy::parse("unknown"), None);
        assert_eq!(BuildStrategy::Heroku.as_remote_str(), "heroku_buildpacks");
    }
}
