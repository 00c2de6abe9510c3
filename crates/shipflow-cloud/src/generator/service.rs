use super::{Operation, to_payload};
use crate::error::GenerateError;
use crate::payload::{PayloadContext, service_request};
use shipflow_core::{NetworkService, ResourceCategory};

pub const SERVICE_ENDPOINT: &str = "/service.create";

pub(super) fn service_operation(
    service: &NetworkService,
    category: ResourceCategory,
    ctx: &PayloadContext,
) -> Result<Operation, GenerateError> {
    let request = service_request(service, ctx);
    let annotation = format!("{} -> {}", service.kind, request.service_type);
    let payload = to_payload(&service.name, &request)?;

    Ok(Operation::post(SERVICE_ENDPOINT, payload, &service.name, category)
        .with_annotation(annotation))
}
