//! ShipFlow Core
//!
//! AppHost の fluent 構成ソースを読み、デプロイ対象のアプリケーションモデルに変換します。
//!
//! ```text
//! ソーステキスト ─▶ parser (チェーンレコード) ─▶ extract (リソースレコード) ─▶ assemble (AppModel)
//! ```
//!
//! ソースはコンパイルも評価もしません。読めないチェーンはエラーとして記録し、
//! 残りのチェーンの処理を続けます。

pub mod assemble;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;

// Re-exports
pub use assemble::{ParseOutcome, assemble};
pub use error::{ModelWarning, ParseError, Result};
pub use model::*;
pub use parser::{ChainRecord, ChainScan, MethodCall, extract_chains, scan_chains};

/// ソーステキストからモデルを組み立てる
///
/// 括弧の不整合で読めなかったチェーンのエラーと、抽出時のエラーをまとめて返す。
pub fn parse_source(source: &str) -> ParseOutcome {
    let scan = scan_chains(source);
    let mut outcome = assemble(&scan.chains);
    if !scan.errors.is_empty() {
        let mut errors = scan.errors;
        errors.append(&mut outcome.errors);
        outcome.errors = errors;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_HOST: &str = r#"
        var builder = DistributedApplication.CreateBuilder(args);

        // データストア
        var postgres = builder.AddPostgres("postgres")
            .WithDataVolume()
            .WithHostPort(5432);
        var db = postgres.AddDatabase("appdb");
        var cache = builder.AddRedis("cache");

        var api = builder.AddProject<Projects.Api>("api")
            .WithReference(db)
            .WithReference(cache)
            .WaitFor(db)
            .WithExternalHttpEndpoints();

        builder.AddNpmApp("frontend", "../frontend")
            .WithReference(api)
            .WithHttpEndpoint(env: "PORT");

        builder.Build().Run();
    "#;

    #[test]
    fn test_parse_source_end_to_end() {
        let outcome = parse_source(APP_HOST);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        // アプリケーションは参照先にならない
        assert_eq!(
            outcome.warnings,
            vec![ModelWarning::UnresolvedReference {
                from: "frontend".into(),
                target: "api".into(),
            }]
        );

        let model = &outcome.model;
        let stores: Vec<&str> = model.stores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(stores, vec!["appdb", "cache"]);
        assert!(model.stores[0].persistent_volume);
        assert_eq!(model.applications.len(), 2);

        let api_refs: Vec<(&str, Option<&str>)> = model
            .references_from("api")
            .map(|r| (r.to.as_str(), r.connection_string_env_var.as_deref()))
            .collect();
        assert_eq!(
            api_refs,
            vec![("appdb", Some("DATABASE_URL")), ("cache", Some("REDIS_URL"))]
        );

        assert_eq!(model.references_from("frontend").count(), 0);
    }

    #[test]
    fn test_parse_source_collects_scan_errors_first() {
        let outcome = parse_source(
            r#"
            builder.AddRedis("broken".WithDataVolume(;
            builder.AddPostgres(name);
            builder.AddRedis("cache");
            "#,
        );
        assert_eq!(outcome.errors.len(), 2);
        assert!(matches!(
            outcome.errors[0],
            ParseError::UnbalancedParens { .. }
        ));
        assert!(matches!(outcome.errors[1], ParseError::MissingName { .. }));
        assert_eq!(outcome.model.stores.len(), 1);
    }

    #[test]
    fn test_parse_source_never_fails_on_garbage() {
        let outcome = parse_source("this is not an app host ((( \"");
        assert!(outcome.model.is_empty());
    }
}
