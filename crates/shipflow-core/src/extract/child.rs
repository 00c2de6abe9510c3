//! 子ストア（AddDatabase）の抽出と親サーバーの差し替え

use crate::error::{ParseError, Result, context_snippet};
use crate::model::DataStore;
use crate::parser::{ChainRecord, positional_args, unquote};
use std::collections::HashSet;

pub const CHILD_STORE_METHOD: &str = "AddDatabase";

/// `server.AddDatabase(...)` のチェーンか
pub fn is_child_store_chain(chain: &ChainRecord) -> bool {
    chain.root_method == CHILD_STORE_METHOD
}

/// 子ストアを組み立てる
///
/// 受け手の変数名で親サーバーを探し、見つかれば種別・イメージ・タグ・ポート・
/// ボリューム設定を引き継ぐ。見つからなければ既定の種別で、設定は何も引き継がない。
pub fn extract_child_store(chain: &ChainRecord, parents: &[DataStore]) -> Result<DataStore> {
    if chain.name.is_empty() {
        return Err(ParseError::MissingName {
            method: chain.root_method.clone(),
            context: context_snippet(&chain.raw),
        });
    }

    let parent = parents
        .iter()
        .find(|p| p.variable.as_deref() == Some(chain.base_object.as_str()));

    let mut child = match parent {
        Some(parent) => DataStore {
            kind: parent.kind,
            parent_name: Some(parent.name.clone()),
            image: parent.image.clone(),
            image_tag: parent.image_tag.clone(),
            host_port: parent.host_port,
            persistent_volume: parent.persistent_volume,
            ..DataStore::new(&chain.name, parent.kind)
        },
        None => {
            tracing::debug!(
                database = %chain.name,
                base = %chain.base_object,
                "parent server not found, using defaults"
            );
            DataStore::new(&chain.name, Default::default())
        }
    };

    child.variable = chain.variable_name.clone();
    child.parent_variable = Some(chain.base_object.clone());
    child.database_name = positional_args(&chain.root_args)
        .get(1)
        .map(|name| unquote(name))
        .filter(|name| !name.is_empty());

    Ok(child)
}

/// 子を持つ親サーバーを、その位置に子を並べる形で置き換える
///
/// 親の見つからなかった子は末尾に追加する。
pub fn dedupe_parent_stores(stores: Vec<DataStore>, children: Vec<DataStore>) -> Vec<DataStore> {
    let parent_variables: HashSet<String> = children
        .iter()
        .filter(|c| c.parent_name.is_some())
        .filter_map(|c| c.parent_variable.clone())
        .collect();

    let (attached, orphans): (Vec<_>, Vec<_>) =
        children.into_iter().partition(|c| c.parent_name.is_some());

    let mut replaced: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(stores.len() + attached.len() + orphans.len());
    for store in stores {
        match &store.variable {
            Some(variable) if parent_variables.contains(variable) => {
                if !replaced.insert(variable.clone()) {
                    continue;
                }
                tracing::debug!(server = %store.name, "replaced by its databases");
                result.extend(
                    attached
                        .iter()
                        .filter(|c| c.parent_variable.as_deref() == Some(variable.as_str()))
                        .cloned(),
                );
            }
            _ => result.push(store),
        }
    }
    result.extend(orphans);
    result
}
