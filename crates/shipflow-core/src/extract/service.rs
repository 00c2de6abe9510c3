//! ネットワークサービスチェーンの抽出

use super::common::{endpoint, env_entry, first_arg, reference_target, split_image};
use super::{Handler, MergePolicy, apply_calls};
use crate::error::{ParseError, Result, context_snippet};
use crate::model::{Endpoint, EndpointProtocol, NetworkService, ServiceKind, VolumeMount};
use crate::parser::{ChainRecord, MethodCall, extract_named_args, parse_port, positional_args, unquote};

/// ルートメソッドとサービス種別の対応
const SERVICE_ROOTS: &[(&str, ServiceKind)] = &[
    ("AddContainer", ServiceKind::Container),
    ("AddRabbitMQ", ServiceKind::RabbitMq),
    ("AddKafka", ServiceKind::Kafka),
    ("AddNats", ServiceKind::Nats),
    ("AddElasticsearch", ServiceKind::Elasticsearch),
    ("AddSeq", ServiceKind::Seq),
    ("AddKeycloak", ServiceKind::Keycloak),
    ("AddGarnet", ServiceKind::Garnet),
    ("AddMinio", ServiceKind::Minio),
];

pub(super) static HANDLERS: &[Handler<NetworkService>] = &[
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
        method: "WithEnvironment",
        policy: MergePolicy::Accumulate,
        apply: with_environment,
    },
    Handler {
        method: "WithBindMount",
        policy: MergePolicy::Accumulate,
        apply: with_mount,
    },
    Handler {
        method: "WithVolume",
        policy: MergePolicy::Accumulate,
        apply: with_mount,
    },
    Handler {
        method: "WithDataVolume",
        policy: MergePolicy::Accumulate,
        apply: with_data_mount,
    },
    Handler {
        method: "WithDataBindMount",
        policy: MergePolicy::Accumulate,
        apply: with_data_mount,
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
        method: "WithReference",
        policy: MergePolicy::Accumulate,
        apply: with_reference,
    },
];

fn service_kind(root_method: &str) -> Option<ServiceKind> {
    SERVICE_ROOTS
        .iter()
        .find(|(method, _)| *method == root_method)
        .map(|(_, kind)| *kind)
}

/// ネットワークサービスのルートメソッドで始まるチェーンか
pub fn is_service_chain(chain: &ChainRecord) -> bool {
    service_kind(&chain.root_method).is_some()
}

/// チェーンからネットワークサービスを組み立てる
pub fn extract_service(chain: &ChainRecord) -> Result<NetworkService> {
    if chain.name.is_empty() {
        return Err(ParseError::MissingName {
            method: chain.root_method.clone(),
            context: context_snippet(&chain.raw),
        });
    }

    let kind = service_kind(&chain.root_method).unwrap_or_default();
    let mut service = NetworkService::new(&chain.name, kind);
    service.variable = chain.variable_name.clone();

    // AddContainer(name, image[, tag])
    if kind == ServiceKind::Container {
        let positional = positional_args(&chain.root_args);
        if let Some(image) = positional.get(1).map(|i| unquote(i)).filter(|i| !i.is_empty()) {
            let (image, embedded_tag) = split_image(&image);
            service.image = Some(image);
            service.image_tag = positional.get(2).map(|t| unquote(t)).or(embedded_tag);
        }
    }
    service.port = extract_named_args(&chain.root_args)
        .get("port")
        .and_then(|port| parse_port(port));

    apply_calls(&mut service, &chain.chained_methods, HANDLERS, 0);
    Ok(service)
}

fn with_image(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    let Some(image) = first_arg(call) else {
        return;
    };
    let (image, embedded_tag) = split_image(&image);
    service.image = Some(image);
    if let Some(tag) = call.args.get(1).map(|t| unquote(t)).or(embedded_tag) {
        service.image_tag = Some(tag);
    }
}

fn with_image_tag(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    if let Some(tag) = first_arg(call) {
        service.image_tag = Some(tag);
    }
}

fn with_host_port(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    service.port = call.args.first().and_then(|port| parse_port(port));
}

fn with_environment(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    if let Some(entry) = env_entry(call) {
        service.environment.push(entry);
    }
}

/// WithBindMount(source, target) / WithVolume(name, target) / WithVolume(target)
fn with_mount(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    let named = extract_named_args(&call.args);
    let positional = positional_args(&call.args);

    let (name, mount_path) = match positional.as_slice() {
        [name, target, ..] => (Some(unquote(name)), Some(unquote(target))),
        [target] => (named.get("name").or(named.get("source")).cloned(), Some(unquote(target))),
        [] => (
            named.get("name").or(named.get("source")).cloned(),
            named.get("target").cloned(),
        ),
    };

    service.volumes.push(VolumeMount {
        name,
        mount_path,
        is_data: false,
    });
}

fn with_data_mount(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    service.volumes.push(VolumeMount {
        name: first_arg(call),
        mount_path: None,
        is_data: true,
    });
}

fn with_endpoint(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    let protocol = match call.method.as_str() {
        "WithHttpsEndpoint" => EndpointProtocol::Https,
        "WithEndpoint" => EndpointProtocol::Tcp,
        _ => EndpointProtocol::Http,
    };
    service.endpoints.push(endpoint(call, protocol));
}

fn with_external_marker(service: &mut NetworkService, _call: &MethodCall, _depth: usize) {
    service.endpoints.push(Endpoint::external_marker());
}

fn with_reference(service: &mut NetworkService, call: &MethodCall, _depth: usize) {
    if let Some(target) = reference_target(call) {
        service.references.push(target);
    }
}
