//! データストアチェーンの抽出

use super::common::{env_entry, first_arg, split_image};
use super::{Handler, MergePolicy, apply_calls};
use crate::error::{ParseError, Result, context_snippet};
use crate::model::{DataStore, StoreKind};
use crate::parser::{
    ChainRecord, MAX_LAMBDA_DEPTH, MethodCall, extract_named_args, parse_lambda_chain, parse_port,
    unquote,
};

/// ルートメソッドとストア種別の対応
const STORE_ROOTS: &[(&str, StoreKind)] = &[
    ("AddPostgres", StoreKind::Postgres),
    ("AddAzurePostgresFlexibleServer", StoreKind::Postgres),
    ("AddMySql", StoreKind::MySql),
    ("AddSqlServer", StoreKind::SqlServer),
    ("AddAzureSqlServer", StoreKind::SqlServer),
    ("AddMongoDB", StoreKind::MongoDb),
    ("AddRedis", StoreKind::Redis),
    ("AddAzureRedis", StoreKind::Redis),
    ("AddValkey", StoreKind::Valkey),
    ("AddOracle", StoreKind::Oracle),
];

pub(super) static HANDLERS: &[Handler<DataStore>] = &[
    Handler {
        method: "WithImage",
        policy: MergePolicy::Overwrite,
        apply: with_image,
    },
    Handler {
        method: "WithImageTag",
        policy: MergePolicy::Overwrite,
        apply: with_image_tag,
    },
    Handler {
        method: "WithHostPort",
        policy: MergePolicy::Overwrite,
        apply: with_host_port,
    },
    Handler {
        method: "WithDataVolume",
        policy: MergePolicy::Flag,
        apply: with_persistent_volume,
    },
    Handler {
        method: "WithDataBindMount",
        policy: MergePolicy::Flag,
        apply: with_persistent_volume,
    },
    Handler {
        method: "WithEnvironment",
        policy: MergePolicy::Accumulate,
        apply: with_environment,
    },
    Handler {
        method: "RunAsContainer",
        policy: MergePolicy::Nested,
        apply: run_as_container,
    },
];

fn store_kind(root_method: &str) -> Option<StoreKind> {
    STORE_ROOTS
        .iter()
        .find(|(method, _)| *method == root_method)
        .map(|(_, kind)| *kind)
}

/// データストアのルートメソッドで始まるチェーンか
pub fn is_store_chain(chain: &ChainRecord) -> bool {
    store_kind(&chain.root_method).is_some()
}

/// チェーンからデータストアを組み立てる
///
/// `AddRedis("cache", port: 6380)` のような名前付き `port` はホストポートとして扱う。
pub fn extract_store(chain: &ChainRecord) -> Result<DataStore> {
    if chain.name.is_empty() {
        return Err(ParseError::MissingName {
            method: chain.root_method.clone(),
            context: context_snippet(&chain.raw),
        });
    }

    let kind = store_kind(&chain.root_method).unwrap_or_default();
    let mut store = DataStore::new(&chain.name, kind);
    store.variable = chain.variable_name.clone();
    store.host_port = extract_named_args(&chain.root_args)
        .get("port")
        .and_then(|port| parse_port(port));

    apply_calls(&mut store, &chain.chained_methods, HANDLERS, 0);
    Ok(store)
}

fn with_image(store: &mut DataStore, call: &MethodCall, _depth: usize) {
    let Some(image) = first_arg(call) else {
        return;
    };
    let (image, embedded_tag) = split_image(&image);
    store.image = Some(image);
    if let Some(tag) = call.args.get(1).map(|t| unquote(t)).or(embedded_tag) {
        store.image_tag = Some(tag);
    }
}

fn with_image_tag(store: &mut DataStore, call: &MethodCall, _depth: usize) {
    if let Some(tag) = first_arg(call) {
        store.image_tag = Some(tag);
    }
}

fn with_host_port(store: &mut DataStore, call: &MethodCall, _depth: usize) {
    // 読めない値はポート無しとして上書きする
    store.host_port = call.args.first().and_then(|port| parse_port(port));
}

fn with_persistent_volume(store: &mut DataStore, _call: &MethodCall, _depth: usize) {
    store.persistent_volume = true;
}

fn with_environment(store: &mut DataStore, call: &MethodCall, _depth: usize) {
    if let Some(entry) = env_entry(call) {
        store.environment.push(entry);
    }
}

fn run_as_container(store: &mut DataStore, call: &MethodCall, depth: usize) {
    if depth >= MAX_LAMBDA_DEPTH {
        tracing::warn!(store = %store.name, depth, "lambda nesting too deep, ignoring");
        return;
    }
    let calls = parse_lambda_chain(&call.raw_args);
    apply_calls(store, &calls, HANDLERS, depth + 1);
}
