//! アプリケーションチェーンの抽出

use super::common::{endpoint, env_entry, first_arg, reference_target};
use super::{Handler, MergePolicy, apply_calls};
use crate::error::{ParseError, Result, context_snippet};
use crate::model::{
    AppKind, Application, BuildStrategy, Endpoint, EndpointProtocol, PublishMode,
};
use crate::parser::{ChainRecord, MethodCall, extract_named_args, parse_port, positional_args, unquote};
use regex::Regex;
use std::sync::LazyLock;

/// `AddProject<Projects.Api>` の型パラメータ
static SOURCE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*Add\w+\s*<\s*([A-Za-z_][\w.]*)\s*>").expect("source identifier pattern is valid")
});

/// ルートメソッドと (アプリ種別, 既定のビルド方式) の対応
const APP_ROOTS: &[(&str, AppKind, BuildStrategy)] = &[
    ("AddProject", AppKind::Project, BuildStrategy::Nixpacks),
    ("AddNpmApp", AppKind::Node, BuildStrategy::Nixpacks),
    ("AddNodeApp", AppKind::Node, BuildStrategy::Nixpacks),
    ("AddViteApp", AppKind::Node, BuildStrategy::Static),
    ("AddPythonApp", AppKind::Python, BuildStrategy::Nixpacks),
    ("AddUvicornApp", AppKind::Python, BuildStrategy::Nixpacks),
    ("AddDockerfile", AppKind::Dockerfile, BuildStrategy::Dockerfile),
    ("AddExecutable", AppKind::Executable, BuildStrategy::Nixpacks),
];

pub(super) static HANDLERS: &[Handler<Application>] = &[
    Handler {
        method: "WithEnvironment",
        policy: MergePolicy::Accumulate,
        apply: with_environment,
    },
    Handler {
        method: "WithHttpEndpoint",
        policy: MergePolicy::Accumulate,
        apply: with_endpoint,
    },
    Handler {
        method: "WithHttpsEndpoint",
        policy: MergePolicy::Accumulate,
        apply: with_endpoint,
    },
    Handler {
        method: "WithEndpoint",
        policy: MergePolicy::Accumulate,
        apply: with_endpoint,
    },
    Handler {
        method: "WithExternalHttpEndpoints",
        policy: MergePolicy::Accumulate,
        apply: with_external_marker,
    },
    Handler {
        method: "WithServiceBinding",
        policy: MergePolicy::Accumulate,
        apply: with_service_binding,
    },
    Handler {
        method: "WithReference",
        policy: MergePolicy::Accumulate,
        apply: with_reference,
    },
    Handler {
        method: "WaitFor",
        policy: MergePolicy::Accumulate,
        apply: wait_for,
    },
    Handler {
        method: "WaitForCompletion",
        policy: MergePolicy::Accumulate,
        apply: wait_for,
    },
    Handler {
        method: "PublishAsDockerFile",
        policy: MergePolicy::Overwrite,
        apply: publish_as_dockerfile,
    },
    Handler {
        method: "PublishAsContainer",
        policy: MergePolicy::Overwrite,
        apply: publish_as_container,
    },
    Handler {
        method: "WithRunScript",
        policy: MergePolicy::Overwrite,
        apply: with_run_script,
    },
    Handler {
        method: "WithInstallCommand",
        policy: MergePolicy::Overwrite,
        apply: with_install_command,
    },
];

fn app_kind(root_method: &str) -> Option<(AppKind, BuildStrategy)> {
    APP_ROOTS
        .iter()
        .find(|(method, _, _)| *method == root_method)
        .map(|(_, kind, build)| (*kind, *build))
}

/// アプリケーションのルートメソッドで始まるチェーンか
pub fn is_application_chain(chain: &ChainRecord) -> bool {
    app_kind(&chain.root_method).is_some()
}

/// チェーンからアプリケーションを組み立てる
///
/// ルートの位置引数は (名前, ソースパス, 実行スクリプト) の順。
/// 2番目は `.` か `/` で始まる場合だけパスとみなし、3番目は Node 系だけが使う。
pub fn extract_application(chain: &ChainRecord) -> Result<Application> {
    if chain.name.is_empty() {
        return Err(ParseError::MissingName {
            method: chain.root_method.clone(),
            context: context_snippet(&chain.raw),
        });
    }

    let (kind, build_strategy) = app_kind(&chain.root_method).unwrap_or_default();
    let mut app = Application::new(&chain.name, kind, build_strategy);
    app.variable = chain.variable_name.clone();
    app.source_identifier = SOURCE_IDENTIFIER
        .captures(&chain.raw)
        .map(|caps| caps[1].to_string());

    let positional = positional_args(&chain.root_args);
    app.source_path = positional
        .get(1)
        .map(|path| unquote(path))
        .filter(|path| path.starts_with('.') || path.starts_with('/'));
    if kind == AppKind::Node {
        app.run_script = positional
            .get(2)
            .map(|script| unquote(script))
            .filter(|script| !script.is_empty());
    }

    apply_calls(&mut app, &chain.chained_methods, HANDLERS, 0);
    Ok(app)
}

fn with_environment(app: &mut Application, call: &MethodCall, _depth: usize) {
    if let Some(entry) = env_entry(call) {
        app.environment.push(entry);
    }
}

fn with_endpoint(app: &mut Application, call: &MethodCall, _depth: usize) {
    let protocol = match call.method.as_str() {
        "WithHttpsEndpoint" => EndpointProtocol::Https,
        "WithEndpoint" => EndpointProtocol::Tcp,
        _ => EndpointProtocol::Http,
    };
    app.endpoints.push(endpoint(call, protocol));
}

fn with_external_marker(app: &mut Application, _call: &MethodCall, _depth: usize) {
    app.endpoints.push(Endpoint::external_marker());
}

/// 旧形式の WithServiceBinding(port) / WithServiceBinding(hostPort: port)
fn with_service_binding(app: &mut Application, call: &MethodCall, _depth: usize) {
    let named = extract_named_args(&call.args);
    let port = named
        .get("hostPort")
        .or(named.get("port"))
        .and_then(|p| parse_port(p))
        .or_else(|| positional_args(&call.args).first().and_then(|p| parse_port(p)));

    app.endpoints.push(Endpoint {
        port,
        protocol: EndpointProtocol::Http,
        is_external: false,
        ..Default::default()
    });
}

fn with_reference(app: &mut Application, call: &MethodCall, _depth: usize) {
    if let Some(target) = reference_target(call) {
        app.references.push(target);
    }
}

fn wait_for(app: &mut Application, call: &MethodCall, _depth: usize) {
    if let Some(target) = reference_target(call) {
        app.wait_for.push(target);
    }
}

fn publish_as_dockerfile(app: &mut Application, _call: &MethodCall, _depth: usize) {
    app.publish_mode = Some(PublishMode::DockerFile);
    app.build_strategy = BuildStrategy::Dockerfile;
}

fn publish_as_container(app: &mut Application, _call: &MethodCall, _depth: usize) {
    app.publish_mode = Some(PublishMode::Container);
    app.build_strategy = BuildStrategy::Dockerfile;
}

fn with_run_script(app: &mut Application, call: &MethodCall, _depth: usize) {
    if let Some(script) = first_arg(call) {
        app.run_script = Some(script);
    }
}

fn with_install_command(app: &mut Application, call: &MethodCall, _depth: usize) {
    if let Some(command) = first_arg(call) {
        app.install_command = Some(command);
    }
}
