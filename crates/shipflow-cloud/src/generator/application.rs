use super::{Operation, to_payload};
use crate::error::GenerateError;
use crate::payload::{PayloadContext, application_request};
use shipflow_core::{Application, ReferenceEdge, ResourceCategory};

pub const APPLICATION_ENDPOINT: &str = "/application.create";

pub(super) fn application_operation<'a>(
    app: &Application,
    references: impl IntoIterator<Item = &'a ReferenceEdge>,
    ctx: &PayloadContext,
) -> Result<Operation, GenerateError> {
    let request = application_request(app, references, app.build_strategy, ctx);

    let mut annotation = format!("{} app, build: {}", app.kind, app.build_strategy);
    if let Some(path) = &app.source_path {
        annotation.push_str(&format!(", source: {path}"));
    }
    if !app.wait_for.is_empty() {
        annotation.push_str(&format!(", after: {}", app.wait_for.join(", ")));
    }

    let payload = to_payload(&app.name, &request)?;
    Ok(Operation::post(
        APPLICATION_ENDPOINT,
        payload,
        &app.name,
        ResourceCategory::Application,
    )
    .with_annotation(annotation))
}
