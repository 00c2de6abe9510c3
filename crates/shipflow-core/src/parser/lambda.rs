//! ラムダ引数内のメソッドチェーン
//!
//! `RunAsContainer(c => c.WithImageTag("16").WithDataVolume())` のように、
//! 引数そのものが小さな fluent チェーンになっている呼び出しを読む。

use super::scanner::{Cursor, LiteralTracker};
use super::MethodCall;

/// ラムダのネストの上限
///
/// 抽出側がラムダ内のラムダを再帰的に読むときの打ち切り条件。
pub const MAX_LAMBDA_DEPTH: usize = 8;

/// ラムダ式のテキストからメソッド呼び出しを宣言順に取り出す
///
/// 対応する形:
/// - `c => c.A().B()`
/// - `(c) => c.A()`
/// - `c => { c.A(); c.B(); }`
/// - `c => { return c.A().B(); }`
///
/// 読めない部分は黙って捨てる。
pub fn parse_lambda_chain(text: &str) -> Vec<MethodCall> {
    let Some((param, body)) = split_arrow(text) else {
        return Vec::new();
    };

    let body = body.trim();
    let statements: Vec<&str> = match body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        Some(block) => split_statements(block),
        None => vec![body],
    };

    statements
        .into_iter()
        .flat_map(|statement| statement_calls(statement, param))
        .collect()
}

/// `param => body` に分ける。引数名は括弧と前後の空白を取り除いたもの
fn split_arrow(text: &str) -> Option<(&str, &str)> {
    let arrow = find_top_level(text, "=>")?;
    let param = text[..arrow]
        .trim()
        .trim_start_matches("static ")
        .trim_start_matches("async ")
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    // `(IResourceBuilder<T> c)` のような型付き引数は最後の語を使う
    let param = param.rsplit(' ').next().unwrap_or(param);
    Some((param, &text[arrow + 2..]))
}

/// リテラル外で最初に現れる `needle` の位置
fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let first = needle.as_bytes()[0];
    let mut literal = LiteralTracker::default();
    let mut prev = None;

    for (pos, &byte) in bytes.iter().enumerate() {
        if literal.feed(byte, prev) {
            prev = Some(byte);
            continue;
        }
        prev = Some(byte);
        if byte == first && text[pos..].starts_with(needle) {
            return Some(pos);
        }
    }
    None
}

/// ブロック本体をトップレベルの `;` で分割する
fn split_statements(block: &str) -> Vec<&str> {
    let bytes = block.as_bytes();
    let mut statements = Vec::new();
    let mut literal = LiteralTracker::default();
    let mut prev = None;
    let mut depth = 0i32;
    let mut start = 0;

    for (pos, &byte) in bytes.iter().enumerate() {
        if literal.feed(byte, prev) {
            prev = Some(byte);
            continue;
        }
        prev = Some(byte);
        match byte {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b';' if depth == 0 => {
                statements.push(block[start..pos].trim());
                start = pos + 1;
            }
            _ => {}
        }
    }
    statements.push(block[start..].trim());
    statements.retain(|s| !s.is_empty());
    statements
}

/// `[return] param.A().B()` を読む
fn statement_calls(statement: &str, param: &str) -> Vec<MethodCall> {
    let statement = statement.trim();
    let statement = statement.strip_prefix("return ").unwrap_or(statement);

    let mut cursor = Cursor::new(statement, 0);
    cursor.skip_ws();
    match cursor.ident() {
        Some(receiver) if receiver == param => {}
        other => {
            tracing::debug!(?other, param, "lambda statement does not start with its parameter");
            return Vec::new();
        }
    }

    match cursor.method_calls() {
        Ok(calls) => calls,
        Err(unbalanced) => {
            tracing::debug!(
                at = unbalanced.at,
                rest = cursor.rest(),
                "unbalanced lambda body, skipping"
            );
            Vec::new()
        }
    }
}
