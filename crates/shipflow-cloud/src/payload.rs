//! Request payloads shared by the script generator and the deploy orchestrator

use crate::remap::{RemoteStoreKind, StoreMapping, default_service_image, remote_service_type};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use shipflow_core::{
    Application, BuildStrategy, DataStore, EnvVar, NetworkService, ReferenceEdge, StoreKind,
};
use std::borrow::Cow;

/// Ports an application exposes when it declares no endpoint
pub const DEFAULT_APP_PORTS: &[u16] = &[3000];

const PASSWORD_LENGTH: usize = 24;

/// Target identifiers stamped onto every payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadContext {
    pub project_id: String,
    pub environment_id: Option<String>,
    pub server_id: Option<String>,
    pub instant_deploy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountRequest {
    /// "volume" or "bind"
    #[serde(rename = "type")]
    pub mount_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
    pub mount_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRequest {
    pub published_port: u16,
    pub target_port: u16,
    pub protocol: String,
}

/// Body of the database create calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub name: String,
    pub app_name: String,
    pub description: String,
    pub docker_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_user: Option<String>,
    pub database_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_port: Option<u16>,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub env: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountRequest>,
}

/// Body of the generic service create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: String,
    pub app_name: String,
    pub description: String,
    pub service_type: String,
    pub docker_image: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub env: String,
    pub ports: Vec<PortRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountRequest>,
}

/// Body of the application create calls
///
/// `repository`/`branch`/`private_access_id` are filled for repository-sourced apps,
/// `docker_image` for image-sourced ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub name: String,
    pub app_name: String,
    pub description: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub build_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_path: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub env: String,
    pub ports: Vec<u16>,
    pub instant_deploy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_access_id: Option<String>,
}

/// Lowercase, dash-separated resource slug
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Random alphanumeric secret for stores that declare no password
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// One `KEY=value` line per entry. Expressions become `KEY=${{token}}`.
///
/// Line breaks inside literal values are written as `\n` and `\r` so every
/// entry stays on one line.
pub fn render_env(entries: &[EnvVar]) -> String {
    entries
        .iter()
        .map(|entry| {
            if entry.is_expression {
                format!("{}=${{{{{}}}}}", entry.key, entry.value)
            } else {
                format!("{}={}", entry.key, single_line(&entry.key, &entry.value))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line<'a>(key: &str, value: &'a str) -> Cow<'a, str> {
    if !value.contains(['\n', '\r']) {
        return Cow::Borrowed(value);
    }
    tracing::warn!(key, "environment value contains a line break, escaping it");
    Cow::Owned(value.replace('\r', "\\r").replace('\n', "\\n"))
}

fn literal_env<'a>(entries: &'a [EnvVar], needle: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| !e.is_expression && e.key.to_uppercase().contains(needle))
        .map(|e| e.value.as_str())
}

/// Image reference for a store
///
/// A substituted store never keeps its declared image, which belongs to the
/// engine the platform cannot run.
pub fn store_image(store: &DataStore, mapping: StoreMapping) -> String {
    let (default_image, default_tag) = match store.kind {
        StoreKind::Valkey => ("valkey/valkey", "8"),
        StoreKind::Garnet => ("ghcr.io/microsoft/garnet", "latest"),
        _ => (mapping.remote.default_image(), mapping.remote.default_tag()),
    };

    if mapping.substituted {
        return format!("{default_image}:{default_tag}");
    }
    match (&store.image, &store.image_tag) {
        (Some(image), Some(tag)) => format!("{image}:{tag}"),
        (Some(image), None) => image.clone(),
        (None, Some(tag)) => format!("{default_image}:{tag}"),
        (None, None) => format!("{default_image}:{default_tag}"),
    }
}

pub fn store_request(store: &DataStore, mapping: StoreMapping, ctx: &PayloadContext) -> StoreRequest {
    let remote: RemoteStoreKind = mapping.remote;
    let slug = slugify(&store.name);

    let description = match &store.parent_name {
        Some(parent) => format!("{} database on {parent}", store.kind),
        None => format!("{} store", store.kind),
    };
    let database_name = remote
        .has_database_name()
        .then(|| store.database_name.clone().unwrap_or_else(|| store.name.clone()));
    let database_user = literal_env(&store.environment, "USER")
        .map(str::to_string)
        .or_else(|| remote.default_user().map(str::to_string));
    let database_password = literal_env(&store.environment, "PASSWORD")
        .map(str::to_string)
        .unwrap_or_else(generate_password);
    let mounts = if store.persistent_volume {
        vec![MountRequest {
            mount_type: "volume".to_string(),
            volume_name: Some(format!("{slug}-data")),
            host_path: None,
            mount_path: remote.data_path().to_string(),
        }]
    } else {
        Vec::new()
    };

    StoreRequest {
        name: store.name.clone(),
        app_name: slug,
        description,
        docker_image: store_image(store, mapping),
        database_name,
        database_user,
        database_password,
        external_port: store.host_port,
        project_id: ctx.project_id.clone(),
        environment_id: ctx.environment_id.clone(),
        server_id: ctx.server_id.clone(),
        env: render_env(&store.environment),
        mounts,
    }
}

/// Image reference for a service, falling back to the kind's default and then to its name
pub fn service_image(service: &NetworkService) -> String {
    match (&service.image, &service.image_tag) {
        (Some(image), Some(tag)) => format!("{image}:{tag}"),
        (Some(image), None) => image.clone(),
        (None, tag) => {
            let base = default_service_image(service.kind)
                .map(str::to_string)
                .unwrap_or_else(|| service.name.clone());
            match tag {
                Some(tag) => {
                    let repo = base.rsplit_once(':').map_or(base.as_str(), |(repo, _)| repo);
                    format!("{repo}:{tag}")
                }
                None => base,
            }
        }
    }
}

fn service_ports(service: &NetworkService) -> Vec<PortRequest> {
    let mut ports: Vec<PortRequest> = service
        .endpoints
        .iter()
        .filter_map(|endpoint| {
            let target = endpoint.effective_port()?;
            Some(PortRequest {
                published_port: endpoint.port.unwrap_or(target),
                target_port: target,
                protocol: "tcp".to_string(),
            })
        })
        .collect();

    if ports.is_empty()
        && let Some(port) = service.port
    {
        ports.push(PortRequest {
            published_port: port,
            target_port: port,
            protocol: "tcp".to_string(),
        });
    }
    ports
}

fn service_mounts(service: &NetworkService, slug: &str) -> Vec<MountRequest> {
    service
        .volumes
        .iter()
        .map(|volume| {
            let mount_path = volume
                .mount_path
                .clone()
                .unwrap_or_else(|| "/data".to_string());
            let is_host_path = volume
                .name
                .as_deref()
                .is_some_and(|n| n.starts_with('.') || n.starts_with('/') || n.contains('\\'));

            if is_host_path && !volume.is_data {
                MountRequest {
                    mount_type: "bind".to_string(),
                    volume_name: None,
                    host_path: volume.name.clone(),
                    mount_path,
                }
            } else {
                let default_name = if volume.is_data {
                    format!("{slug}-data")
                } else {
                    slug.to_string()
                };
                MountRequest {
                    mount_type: "volume".to_string(),
                    volume_name: Some(volume.name.clone().unwrap_or(default_name)),
                    host_path: None,
                    mount_path,
                }
            }
        })
        .collect()
}

pub fn service_request(service: &NetworkService, ctx: &PayloadContext) -> ServiceRequest {
    let slug = slugify(&service.name);
    ServiceRequest {
        name: service.name.clone(),
        app_name: slug.clone(),
        description: format!("{} service", service.kind),
        service_type: remote_service_type(service.kind).to_string(),
        docker_image: service_image(service),
        project_id: ctx.project_id.clone(),
        environment_id: ctx.environment_id.clone(),
        server_id: ctx.server_id.clone(),
        env: render_env(&service.environment),
        ports: service_ports(service),
        mounts: service_mounts(service, &slug),
    }
}

/// Container ports of an application, target ports first
pub fn application_ports(app: &Application) -> Vec<u16> {
    let mut ports = Vec::new();
    for port in app.endpoints.iter().filter_map(|e| e.effective_port()) {
        if !ports.contains(&port) {
            ports.push(port);
        }
    }
    if ports.is_empty() {
        ports.extend_from_slice(DEFAULT_APP_PORTS);
    }
    ports
}

/// Application env plus one connection-string expression per store it references
///
/// An explicitly declared key wins over a derived one.
pub fn application_env<'a>(
    app: &Application,
    references: impl IntoIterator<Item = &'a ReferenceEdge>,
) -> Vec<EnvVar> {
    let mut env = app.environment.clone();
    for edge in references {
        let Some(var) = &edge.connection_string_env_var else {
            continue;
        };
        if env.iter().any(|e| &e.key == var) {
            tracing::warn!(app = %app.name, key = %var, to = %edge.to, "connection variable already set, keeping the first");
            continue;
        }
        env.push(EnvVar::expression(var, format!("{}.{}", edge.to, var)));
    }
    env
}

pub fn application_request<'a>(
    app: &Application,
    references: impl IntoIterator<Item = &'a ReferenceEdge>,
    build_strategy: BuildStrategy,
    ctx: &PayloadContext,
) -> ApplicationRequest {
    let description = match &app.source_identifier {
        Some(identifier) => format!("{} app ({identifier})", app.kind),
        None => format!("{} app", app.kind),
    };

    ApplicationRequest {
        name: app.name.clone(),
        app_name: slugify(&app.name),
        description,
        project_id: ctx.project_id.clone(),
        environment_id: ctx.environment_id.clone(),
        server_id: ctx.server_id.clone(),
        build_type: build_strategy.as_remote_str().to_string(),
        build_path: app.source_path.clone(),
        env: render_env(&application_env(app, references)),
        ports: application_ports(app),
        instant_deploy: ctx.instant_deploy,
        start_command: app.run_script.clone(),
        install_command: app.install_command.clone(),
        docker_image: None,
        repository: None,
        branch: None,
        private_access_id: None,
    }
}

/// Directory inside the repository that holds the application
///
/// Joins the repository base path with the source path after dropping leading
/// `./` and `../` segments. Without a base path the source path is used as is.
pub fn base_directory(repo_base: Option<&str>, source_path: Option<&str>) -> Option<String> {
    let base = repo_base
        .map(|b| b.trim_end_matches('/'))
        .filter(|b| !b.is_empty());
    let Some(base) = base else {
        return source_path.map(str::to_string);
    };
    let Some(path) = source_path else {
        return Some(base.to_string());
    };

    let mut rest = path.trim_start_matches('/');
    while let Some(stripped) = rest
        .strip_prefix("./")
        .or_else(|| rest.strip_prefix("../"))
    {
        rest = stripped;
    }
    let rest = rest.trim_end_matches('/');

    if rest.is_empty() || rest == "." || rest == ".." {
        Some(base.to_string())
    } else {
        Some(format!("{base}/{rest}"))
    }
}
