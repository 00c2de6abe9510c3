//! 引数リストの分割と値の取り出し

use super::scanner::LiteralTracker;
use std::collections::HashMap;

/// 引数リストをトップレベルのカンマで分割する
///
/// 括弧・角括弧・波括弧の内側と文字列リテラル内のカンマでは分割しない。
/// 空の引数リストは空の Vec になる。
pub fn parse_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let bytes = raw.as_bytes();
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut literal = LiteralTracker::default();
    let mut prev = None;
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
            b',' if depth == 0 => {
                args.push(raw[start..pos].trim().to_string());
                start = pos + 1;
            }
            _ => {}
        }
    }
    args.push(raw[start..].trim().to_string());

    args
}

/// 最初の文字列リテラルの中身を返す
pub fn extract_first_string_arg(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(|&b| b == b'"')?;
    let verbatim = start > 0 && bytes[start - 1] == b'@';

    let mut value = String::new();
    let mut chars = raw[start + 1..].chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if !verbatim => {
                if let Some(next) = chars.next() {
                    value.push(unescape(next));
                }
            }
            '"' if verbatim && chars.peek() == Some(&'"') => {
                chars.next();
                value.push('"');
            }
            '"' => return Some(value),
            _ => value.push(c),
        }
    }

    // 閉じ引用符なし
    None
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// 値が文字列リテラル（`"..."`, `@"..."`, `$"..."`）かどうか
pub fn is_string_literal(value: &str) -> bool {
    let value = value.trim();
    let body = value.trim_start_matches(['@', '$']);
    body.len() >= 2 && body.starts_with('"') && body.ends_with('"')
}

/// 前後の引用符を取り除く。リテラルでなければトリムした値をそのまま返す
pub fn unquote(value: &str) -> String {
    let value = value.trim();
    if is_string_literal(value) {
        extract_first_string_arg(value).unwrap_or_default()
    } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// `name: value` 形式の名前付き引数を取り出す
///
/// 値の前後の引用符は取り除く。位置引数は無視する。
pub fn extract_named_args(args: &[String]) -> HashMap<String, String> {
    args.iter()
        .filter_map(|arg| split_named(arg))
        .map(|(name, value)| (name.to_string(), unquote(value)))
        .collect()
}

/// 名前付きでない引数を宣言順に返す
pub fn positional_args(args: &[String]) -> Vec<&str> {
    args.iter()
        .filter(|arg| split_named(arg).is_none())
        .map(|arg| arg.as_str())
        .collect()
}

fn split_named(arg: &str) -> Option<(&str, &str)> {
    let arg = arg.trim();
    let ident_len = arg
        .bytes()
        .take_while(|b| *b == b'_' || b.is_ascii_alphanumeric())
        .count();
    if ident_len == 0 || arg.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    let rest = arg[ident_len..].trim_start();
    // `a ? b : c` や `::` はここで弾かれる
    let value = rest.strip_prefix(':')?;
    if value.starts_with(':') {
        return None;
    }
    Some((&arg[..ident_len], value.trim()))
}

/// 数値リテラルをポート番号として読む（`5432`, `"5432"` どちらも可）
///
/// 読めないものは None。例外にはしない。
pub fn parse_port(value: &str) -> Option<u16> {
    unquote(value).trim().parse::<u16>().ok()
}
