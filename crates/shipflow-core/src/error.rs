use thiserror::Error;

/// チェーン単位の解析エラー。1つのチェーンだけを捨て、スキャンは続ける
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("括弧の対応が取れません: `{context}`")]
    UnbalancedParens { context: String },

    #[error("{method}() のリソース名がありません: `{context}`")]
    MissingName { method: String, context: String },
}

/// 組み立て済みモデルへの警告。モデルの利用は妨げない
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelWarning {
    #[error("リソース名が重複しています: '{name}' ({category})")]
    DuplicateName { name: String, category: String },

    #[error("'{from}' の参照先 '{target}' に一致するリソースがありません")]
    UnresolvedReference { from: String, target: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;

const CONTEXT_LIMIT: usize = 80;

/// エラー表示用にソース片を切り詰める
pub(crate) fn context_snippet(raw: &str) -> String {
    if raw.chars().count() <= CONTEXT_LIMIT {
        return raw.to_string();
    }
    let mut snippet: String = raw.chars().take(CONTEXT_LIMIT).collect();
    snippet.push_str("...");
    snippet
}
