//! 複数カテゴリで共有する引数の読み方

use crate::model::{Endpoint, EndpointProtocol, EnvVar};
use crate::parser::{
    MethodCall, extract_named_args, is_string_literal, parse_port, positional_args, unquote,
};

/// `WithEnvironment(key, value)` を読む
///
/// 値が引用符付きならリテラル、そうでなければ式（変数参照）として生テキストを保持する。
/// 引数が2つに満たない、またはキーが空の場合は None。
pub fn env_entry(call: &MethodCall) -> Option<EnvVar> {
    let named = extract_named_args(&call.args);
    let mut positional = positional_args(&call.args).into_iter();

    let key = match named.get("name") {
        Some(key) => key.clone(),
        None => unquote(positional.next()?),
    };
    let value = raw_named(&call.args, "value")
        .or_else(|| positional.next())?
        .trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some(if is_string_literal(value) {
        EnvVar::literal(key, unquote(value))
    } else {
        EnvVar::expression(key, value)
    })
}

/// `name: value` の value を引用符付きのまま返す
fn raw_named<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter().find_map(|arg| {
        let rest = arg.trim().strip_prefix(name)?.trim_start();
        let value = rest.strip_prefix(':')?;
        (!value.starts_with(':')).then(|| value.trim())
    })
}

/// 位置引数の並び（メソッドごとに異なる）
fn positional_names(method: &str) -> &'static [&'static str] {
    match method {
        "WithEndpoint" => &["port", "targetPort", "scheme", "name", "env"],
        _ => &["port", "targetPort", "name", "env"],
    }
}

/// エンドポイント宣言を読む
pub fn endpoint(call: &MethodCall, protocol: EndpointProtocol) -> Endpoint {
    let mut named = extract_named_args(&call.args);
    for (slot, value) in positional_names(&call.method)
        .iter()
        .zip(positional_args(&call.args))
    {
        named
            .entry((*slot).to_string())
            .or_insert_with(|| unquote(value));
    }

    let protocol = named
        .get("scheme")
        .map(|s| EndpointProtocol::parse(s))
        .unwrap_or(protocol);

    Endpoint {
        port: named.get("port").and_then(|p| parse_port(p)),
        target_port: named.get("targetPort").and_then(|p| parse_port(p)),
        protocol,
        is_external: named.get("isExternal").is_some_and(|v| v == "true"),
        env_variable: named.get("env").filter(|v| !v.is_empty()).cloned(),
        name: named.get("name").filter(|v| !v.is_empty()).cloned(),
    }
}

/// 参照先の名前を読む
///
/// `db` でも `db.Resource` でも、最初の `.` より前の識別子だけを使う。
pub fn reference_target(call: &MethodCall) -> Option<String> {
    let first = call.args.first()?.trim();
    if is_string_literal(first) {
        let name = unquote(first);
        return (!name.is_empty()).then_some(name);
    }

    let ident: String = first
        .chars()
        .take_while(|c| *c == '_' || c.is_ascii_alphanumeric())
        .collect();
    (!ident.is_empty()).then_some(ident)
}

/// 最初の引数を文字列として読む（引用符は外す）
pub fn first_arg(call: &MethodCall) -> Option<String> {
    call.args
        .first()
        .map(|arg| unquote(arg))
        .filter(|value| !value.is_empty())
}

/// `image:tag` を分ける。`registry:5000/image` のようなポート付きレジストリは分けない
pub fn split_image(image: &str) -> (String, Option<String>) {
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') && !name.is_empty() && !tag.is_empty() => {
            (name.to_string(), Some(tag.to_string()))
        }
        _ => (image.to_string(), None),
    }
}
