//! AppHost ソースのトークナイザ
//!
//! ソーステキストから `builder.AddXxx(...)` で始まる fluent チェーンを探し、
//! チェーンレコードの列に変換します。型チェックや構文木の構築は行わず、
//! 読めないチェーンは1本ずつ諦めて次を探します。

mod args;
mod lambda;
mod scanner;

pub use args::{
    extract_first_string_arg, extract_named_args, is_string_literal, parse_args, parse_port,
    positional_args, unquote,
};
pub use lambda::{MAX_LAMBDA_DEPTH, parse_lambda_chain};
pub use scanner::{Unbalanced, find_closing_paren};

use crate::error::{ParseError, context_snippet};
use regex::Regex;
use scanner::{Cursor, LiteralTracker};
use serde::Serialize;
use std::sync::LazyLock;

/// `[var x =] base.AddXxx` の開始部分
///
/// `x => y.AddXxx` の `=>` は `=` の直後に識別子が来ないので変数束縛にはならない。
static ROOT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b(?:var|[A-Za-z_][\w.]*(?:<[\w.,\s<>]*>)?)\s+([A-Za-z_]\w*)\s*=\s*)?\b([A-Za-z_]\w*)\s*\.\s*(Add[A-Za-z_]\w*)\b",
    )
    .expect("root call pattern is valid")
});

/// チェーン上の1回のメソッド呼び出し
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub method: String,
    /// トップレベルのカンマで分割した引数
    pub args: Vec<String>,
    /// 括弧内の生テキスト
    pub raw_args: String,
}

impl MethodCall {
    pub fn new(method: &str, raw_args: &str) -> Self {
        Self {
            method: method.to_string(),
            args: parse_args(raw_args),
            raw_args: raw_args.trim().to_string(),
        }
    }
}

/// チェーンレコード - ソース上の fluent 文1本分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    /// `var x = ...` の束縛名
    pub variable_name: Option<String>,
    /// `builder` や `pg` などの受け手
    pub base_object: String,
    /// `AddPostgres` などのルートメソッド名
    pub root_method: String,
    pub root_args: Vec<String>,
    /// ルート引数の最初の文字列リテラル（無ければ空文字）
    pub name: String,
    /// ソース順。後の呼び出しが前の設定を上書きすることがある
    pub chained_methods: Vec<MethodCall>,
    /// 正規化済みテキスト上のチェーン全体
    pub raw: String,
}

impl ChainRecord {
    /// 指定メソッドの呼び出しを宣言順に返す
    pub fn calls<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a MethodCall> {
        self.chained_methods.iter().filter(move |c| c.method == method)
    }
}

/// スキャン結果
#[derive(Debug, Clone, Default)]
pub struct ChainScan {
    pub chains: Vec<ChainRecord>,
    pub errors: Vec<ParseError>,
}

/// コメントを取り除き、空白をまとめる
///
/// 文字列リテラル内のコメント記号や空白には手を付けない。
pub fn normalize_source(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut literal = LiteralTracker::default();
    let mut prev = None;
    let mut pos = 0;
    let mut line_start = true;

    while pos < bytes.len() {
        let byte = bytes[pos];

        // `#region` や `#pragma` などのプリプロセッサ行は行末まで読み飛ばす
        if line_start && byte == b'#' && !literal.in_literal() {
            pos = skip_line(bytes, pos);
            continue;
        }

        if literal.in_literal() || !starts_comment(bytes, pos) {
            let in_literal = literal.feed(byte, prev);
            line_start = !in_literal
                && (byte == b'\n' || (line_start && (byte == b' ' || byte == b'\t')));
            if in_literal {
                out.push(byte);
            } else if byte.is_ascii_whitespace() {
                if out.last().is_some_and(|b| *b != b' ') {
                    out.push(b' ');
                }
            } else {
                out.push(byte);
            }
            prev = Some(byte);
            pos += 1;
            continue;
        }

        // コメントは空白1個として扱う
        if bytes[pos + 1] == b'/' {
            pos = skip_line(bytes, pos);
        } else {
            pos = source[pos + 2..]
                .find("*/")
                .map_or(bytes.len(), |offset| pos + 2 + offset + 2);
        }
        if out.last().is_some_and(|b| *b != b' ') {
            out.push(b' ');
        }
        prev = Some(b' ');
    }

    while out.last() == Some(&b' ') {
        out.pop();
    }
    // 入力は &str で、区切りに使ったのはASCIIだけなのでUTF-8のまま
    String::from_utf8_lossy(&out).into_owned()
}

/// 改行の手前まで進めた位置を返す。改行そのものは残す
fn skip_line(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |offset| pos + offset)
}

fn starts_comment(bytes: &[u8], pos: usize) -> bool {
    bytes[pos] == b'/' && matches!(bytes.get(pos + 1), Some(b'/') | Some(b'*'))
}

/// ソースからチェーンレコードを取り出す
pub fn extract_chains(source: &str) -> Vec<ChainRecord> {
    scan_chains(source).chains
}

/// ソースからチェーンレコードを取り出し、読めなかったチェーンをエラーとして返す
pub fn scan_chains(source: &str) -> ChainScan {
    let text = normalize_source(source);
    let mut scan = ChainScan::default();
    let mut pos = 0;

    while let Some(caps) = ROOT_CALL.captures_at(&text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let start = whole.start();

        let mut cursor = Cursor::new(&text, whole.end());
        cursor.skip_ws();
        cursor.skip_type_args();
        cursor.skip_ws();
        if cursor.peek() != Some(b'(') {
            // `builder.AddFoo` の後に呼び出しが続かない
            pos = whole.end();
            continue;
        }

        let root_raw = match cursor.balanced_args() {
            Ok(raw) => raw,
            Err(unbalanced) => {
                scan.errors.push(ParseError::UnbalancedParens {
                    context: context_snippet(&text[start..]),
                });
                pos = unbalanced.at + 1;
                continue;
            }
        };

        let chained_methods = match cursor.method_calls() {
            Ok(calls) => calls,
            Err(unbalanced) => {
                scan.errors.push(ParseError::UnbalancedParens {
                    context: context_snippet(&text[start..]),
                });
                pos = unbalanced.at + 1;
                continue;
            }
        };

        let end = cursor.pos();
        let record = ChainRecord {
            variable_name: caps.get(1).map(|m| m.as_str().to_string()),
            base_object: caps[2].to_string(),
            root_method: caps[3].to_string(),
            root_args: parse_args(root_raw),
            name: extract_first_string_arg(root_raw).unwrap_or_default(),
            chained_methods,
            raw: text[start..end].to_string(),
        };
        tracing::debug!(
            root = %record.root_method,
            name = %record.name,
            calls = record.chained_methods.len(),
            "extracted chain"
        );
        scan.chains.push(record);
        pos = end;
    }

    scan
}

#[cfg(test)]
mod tests;
