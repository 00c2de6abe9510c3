//! チェーンレコードからアプリケーションモデルを組み立てる

use crate::error::{ModelWarning, ParseError};
use crate::extract::{
    dedupe_parent_stores, extract_application, extract_child_store, extract_service,
    extract_store, is_application_chain, is_child_store_chain, is_service_chain, is_store_chain,
};
use crate::model::{
    AppModel, DataStore, NetworkService, ReferenceEdge, ResourceCategory, ServiceKind, StoreKind,
};
use crate::parser::ChainRecord;
use std::collections::HashMap;

/// パース結果
///
/// エラーは読めなかったチェーン、警告はモデルとして怪しい箇所。
/// どちらがあってもモデル自体は使える。
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub model: AppModel,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ModelWarning>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// チェーンを分類してモデルにまとめる
///
/// 判定順はストア、サービス、アプリケーション。どれにも当たらないチェーンは捨てる。
pub fn assemble(chains: &[ChainRecord]) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut stores = Vec::new();
    let mut child_chains = Vec::new();
    let model = &mut outcome.model;

    for chain in chains {
        let result = if is_child_store_chain(chain) {
            child_chains.push(chain);
            Ok(())
        } else if is_store_chain(chain) {
            extract_store(chain).map(|store| stores.push(store))
        } else if is_service_chain(chain) {
            extract_service(chain).map(|service| match service.kind {
                ServiceKind::Garnet => stores.push(garnet_store(service)),
                ServiceKind::Minio => model.storage_services.push(service),
                _ => model.services.push(service),
            })
        } else if is_application_chain(chain) {
            extract_application(chain).map(|app| model.applications.push(app))
        } else {
            tracing::debug!(root = %chain.root_method, "unknown root method, ignored");
            Ok(())
        };

        if let Err(error) = result {
            tracing::warn!(%error, "skipping chain");
            outcome.errors.push(error);
        }
    }

    let mut children = Vec::with_capacity(child_chains.len());
    for chain in child_chains {
        match extract_child_store(chain, &stores) {
            Ok(child) => children.push(child),
            Err(error) => {
                tracing::warn!(%error, "skipping child store");
                outcome.errors.push(error);
            }
        }
    }
    outcome.model.stores = dedupe_parent_stores(stores, children);

    let (references, unresolved) = build_references(&outcome.model);
    outcome.model.references = references;
    outcome.warnings.extend(duplicate_names(&outcome.model));
    outcome.warnings.extend(unresolved);

    tracing::debug!(
        stores = outcome.model.stores.len(),
        services = outcome.model.services.len(),
        storage = outcome.model.storage_services.len(),
        applications = outcome.model.applications.len(),
        references = outcome.model.references.len(),
        "assembled model"
    );
    outcome
}

/// AddGarnet はネットワークサービスとして読んでからストアに移す
fn garnet_store(service: NetworkService) -> DataStore {
    DataStore {
        variable: service.variable,
        image: service.image,
        image_tag: service.image_tag,
        host_port: service.port,
        persistent_volume: service.volumes.iter().any(|v| v.is_data),
        environment: service.environment,
        ..DataStore::new(service.name, StoreKind::Garnet)
    }
}

/// 参照先の解決結果
struct Target<'a> {
    name: &'a str,
    store_kind: Option<StoreKind>,
}

/// 宣言名または変数名から参照先を引く表
///
/// 参照先はストア、サービス、ストレージに限る。アプリケーションは登録しない。
/// 同じキーは先に登録したもの（ストア、サービス、ストレージの順）が勝つ。
struct TargetIndex<'a> {
    targets: HashMap<&'a str, Target<'a>>,
}

impl<'a> TargetIndex<'a> {
    fn new(model: &'a AppModel) -> Self {
        let mut index = Self {
            targets: HashMap::new(),
        };

        for store in &model.stores {
            index.insert_store(store, store.variable.as_deref());
        }
        // 消えた親サーバーの変数は最初の子に向ける
        for store in model.stores.iter().filter(|s| s.parent_name.is_some()) {
            if let Some(parent_variable) = store.parent_variable.as_deref() {
                index.insert_store(store, Some(parent_variable));
            }
        }
        for service in model.services.iter().chain(&model.storage_services) {
            index.insert(&service.name, service.variable.as_deref(), None);
        }
        index
    }

    fn insert_store(&mut self, store: &'a DataStore, key: Option<&'a str>) {
        self.insert(&store.name, key, Some(store.kind));
    }

    fn insert(&mut self, name: &'a str, variable: Option<&'a str>, store_kind: Option<StoreKind>) {
        for key in std::iter::once(name).chain(variable) {
            self.targets
                .entry(key)
                .or_insert(Target { name, store_kind });
        }
    }

    fn resolve(&self, key: &str) -> Option<&Target<'a>> {
        self.targets.get(key)
    }
}

/// アプリ、サービスの順に参照エッジを作る。解決できない参照は警告にする
fn build_references(model: &AppModel) -> (Vec<ReferenceEdge>, Vec<ModelWarning>) {
    let index = TargetIndex::new(model);
    let mut edges: Vec<ReferenceEdge> = Vec::new();
    let mut warnings = Vec::new();

    let declared = model
        .applications
        .iter()
        .map(|app| (app.name.as_str(), &app.references))
        .chain(
            model
                .services
                .iter()
                .chain(&model.storage_services)
                .map(|service| (service.name.as_str(), &service.references)),
        );

    for (from, targets) in declared {
        for target in targets {
            let Some(resolved) = index.resolve(target) else {
                tracing::warn!(from, target = %target, "unresolved reference");
                warnings.push(ModelWarning::UnresolvedReference {
                    from: from.to_string(),
                    target: target.clone(),
                });
                continue;
            };

            let edge = ReferenceEdge {
                from: from.to_string(),
                to: resolved.name.to_string(),
                connection_string_env_var: resolved
                    .store_kind
                    .map(|kind| kind.connection_env_var().to_string()),
            };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }

    (edges, warnings)
}

/// 4つのコレクションを通して2回目以降に現れた名前ごとに警告を出す
fn duplicate_names(model: &AppModel) -> Vec<ModelWarning> {
    let mut seen: HashMap<&str, ResourceCategory> = HashMap::new();
    let mut warnings = Vec::new();

    for (category, name) in model.resource_names() {
        if seen.insert(name, category).is_some() {
            warnings.push(ModelWarning::DuplicateName {
                name: name.to_string(),
                category: category.to_string(),
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppKind, BuildStrategy};
    use crate::parser::extract_chains;

    fn assemble_source(source: &str) -> ParseOutcome {
        assemble(&extract_chains(source))
    }

    #[test]
    fn test_empty_source_gives_empty_model() {
        let outcome = assemble_source("var builder = DistributedApplication.CreateBuilder(args);");
        assert!(outcome.model.is_empty());
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_classification() {
        let outcome = assemble_source(
            r#"
            var pg = builder.AddPostgres("pg");
            var garnet = builder.AddGarnet("garnet").WithDataVolume();
            var blobs = builder.AddMinio("blobs");
            var mq = builder.AddRabbitMQ("mq");
            builder.AddProject<Projects.Api>("api");
            builder.AddParameter("secret");
            "#,
        );

        let model = &outcome.model;
        let stores: Vec<(&str, StoreKind)> =
            model.stores.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            stores,
            vec![("pg", StoreKind::Postgres), ("garnet", StoreKind::Garnet)]
        );
        assert!(model.stores[1].persistent_volume);
        assert_eq!(model.storage_services.len(), 1);
        assert_eq!(model.storage_services[0].name, "blobs");
        assert_eq!(model.services.len(), 1);
        assert_eq!(model.services[0].name, "mq");
        assert_eq!(model.applications.len(), 1);
        assert_eq!(model.applications[0].kind, AppKind::Project);
    }

    #[test]
    fn test_child_store_replaces_parent() {
        let outcome = assemble_source(
            r#"
            var server = builder.AddPostgres("server").WithImageTag("16").WithHostPort(5433).WithDataVolume();
            var cache = builder.AddRedis("cache");
            var db = server.AddDatabase("db");
            "#,
        );

        let stores = &outcome.model.stores;
        let names: Vec<&str> = stores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["db", "cache"]);
        assert_eq!(stores[0].image_tag.as_deref(), Some("16"));
        assert_eq!(stores[0].host_port, Some(5433));
        assert!(stores[0].persistent_volume);
        assert_eq!(stores[0].parent_name.as_deref(), Some("server"));
    }

    #[test]
    fn test_orphan_children_go_last() {
        let outcome = assemble_source(
            r#"
            var orphan = missing.AddDatabase("orphan");
            var cache = builder.AddRedis("cache");
            "#,
        );
        let names: Vec<&str> = outcome.model.stores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "orphan"]);
        assert_eq!(outcome.model.stores[1].kind, StoreKind::Postgres);
    }

    #[test]
    fn test_reference_to_store_variable() {
        let outcome = assemble_source(
            r#"
            var database = builder.AddPostgres("pg-main");
            builder.AddNpmApp("web", "./web").WithReference(database).WaitFor(database);
            "#,
        );

        assert_eq!(
            outcome.model.references,
            vec![ReferenceEdge {
                from: "web".into(),
                to: "pg-main".into(),
                connection_string_env_var: Some("DATABASE_URL".into()),
            }]
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_reference_to_elided_parent_resolves_to_first_child() {
        let outcome = assemble_source(
            r#"
            var server = builder.AddMySql("server");
            var first = server.AddDatabase("first");
            var second = server.AddDatabase("second");
            builder.AddProject<Projects.Api>("api").WithReference(server);
            "#,
        );

        let edge = &outcome.model.references[0];
        assert_eq!(edge.to, "first");
        assert_eq!(edge.connection_string_env_var.as_deref(), Some("MYSQL_URL"));
    }

    #[test]
    fn test_reference_to_service_has_no_connection_var() {
        let outcome = assemble_source(
            r#"
            var mq = builder.AddRabbitMQ("mq");
            var garnet = builder.AddGarnet("kv");
            builder.AddProject<Projects.Worker>("worker").WithReference(mq).WithReference(garnet);
            "#,
        );

        let refs = &outcome.model.references;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].to, "mq");
        assert_eq!(refs[0].connection_string_env_var, None);
        assert_eq!(refs[1].to, "kv");
        assert_eq!(
            refs[1].connection_string_env_var.as_deref(),
            Some("CONNECTION_STRING")
        );
    }

    #[test]
    fn test_applications_are_linked_before_services() {
        let outcome = assemble_source(
            r#"
            var cache = builder.AddRedis("cache");
            builder.AddContainer("proxy", "nginx").WithReference(cache);
            builder.AddNpmApp("web", "./web").WithReference(cache);
            "#,
        );
        let froms: Vec<&str> = outcome
            .model
            .references
            .iter()
            .map(|r| r.from.as_str())
            .collect();
        assert_eq!(froms, vec!["web", "proxy"]);
    }

    #[test]
    fn test_unresolved_reference_is_a_warning() {
        let outcome = assemble_source(
            r#"builder.AddNpmApp("web", "./web").WithReference(nowhere);"#,
        );
        assert!(outcome.model.references.is_empty());
        assert_eq!(
            outcome.warnings,
            vec![ModelWarning::UnresolvedReference {
                from: "web".into(),
                target: "nowhere".into(),
            }]
        );
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_reference_to_application_is_unresolved() {
        let outcome = assemble_source(
            r#"
            var api = builder.AddProject<Projects.Api>("api");
            builder.AddNpmApp("web", "./web").WithReference(api);
            "#,
        );
        assert!(outcome.model.references.is_empty());
        assert_eq!(
            outcome.warnings,
            vec![ModelWarning::UnresolvedReference {
                from: "web".into(),
                target: "api".into(),
            }]
        );
    }

    #[test]
    fn test_duplicate_names_warn_per_occurrence() {
        let outcome = assemble_source(
            r#"
            builder.AddRedis("shared");
            builder.AddRabbitMQ("shared");
            builder.AddNpmApp("shared", "./x");
            "#,
        );
        assert_eq!(outcome.model.resource_count(), 3);
        let duplicates = outcome
            .warnings
            .iter()
            .filter(|w| matches!(w, ModelWarning::DuplicateName { .. }))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_missing_name_is_an_error_and_parse_continues() {
        let outcome = assemble_source(
            r#"
            builder.AddPostgres(name);
            builder.AddNpmApp("web", "./web");
            "#,
        );
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            &outcome.errors[0],
            ParseError::MissingName { method, .. } if method == "AddPostgres"
        ));
        assert_eq!(outcome.model.applications.len(), 1);
        assert_eq!(
            outcome.model.applications[0].build_strategy,
            BuildStrategy::Nixpacks
        );
    }
}
