//! チェーンレコードからリソースレコードへの抽出
//!
//! ルートメソッド名でカテゴリを判定し、チェーン上のメソッド呼び出しを
//! メソッドごとのハンドラに流してレコードを組み立てます。
//! ハンドラは上書き（後勝ち）か追記かを個別に宣言します。

mod application;
mod child;
mod common;
mod service;
mod store;

pub use application::{extract_application, is_application_chain};
pub use child::{CHILD_STORE_METHOD, dedupe_parent_stores, extract_child_store, is_child_store_chain};
pub use service::{extract_service, is_service_chain};
pub use store::{extract_store, is_store_chain};

use crate::model::ResourceCategory;
use crate::parser::MethodCall;

/// 同じメソッドが複数回呼ばれたときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// 後の呼び出しが前の値を置き換える
    Overwrite,
    /// 呼び出しごとに1件追加する
    Accumulate,
    /// 真にするだけ（何度呼んでも同じ）
    Flag,
    /// ラムダ内のチェーンを同じハンドラで再生する
    Nested,
}

/// メソッド1つ分のハンドラ
pub(crate) struct Handler<R> {
    pub method: &'static str,
    pub policy: MergePolicy,
    pub apply: fn(&mut R, &MethodCall, usize),
}

/// 呼び出しを宣言順にハンドラへ流す。知らないメソッドは無視する
pub(crate) fn apply_calls<R>(
    record: &mut R,
    calls: &[MethodCall],
    handlers: &[Handler<R>],
    depth: usize,
) {
    for call in calls {
        match handlers.iter().find(|h| h.method == call.method) {
            Some(handler) => (handler.apply)(record, call, depth),
            None => tracing::trace!(method = %call.method, "no handler, ignored"),
        }
    }
}

fn policy_in<R>(handlers: &[Handler<R>], method: &str) -> Option<MergePolicy> {
    handlers
        .iter()
        .find(|h| h.method == method)
        .map(|h| h.policy)
}

/// カテゴリごとのメソッドの扱いを返す（未対応メソッドは None）
pub fn method_policy(category: ResourceCategory, method: &str) -> Option<MergePolicy> {
    match category {
        ResourceCategory::Store => policy_in(store::HANDLERS, method),
        ResourceCategory::Service | ResourceCategory::Storage => {
            policy_in(service::HANDLERS, method)
        }
        ResourceCategory::Application => policy_in(application::HANDLERS, method),
    }
}
