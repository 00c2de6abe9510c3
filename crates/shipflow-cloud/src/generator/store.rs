use super::{Operation, to_payload};
use crate::error::GenerateError;
use crate::payload::{PayloadContext, store_request};
use crate::remap::{remote_store_kind, substitution_warning};
use shipflow_core::{DataStore, ResourceCategory};

pub(super) fn store_operation(
    store: &DataStore,
    ctx: &PayloadContext,
    warnings: &mut Vec<String>,
) -> Result<Operation, GenerateError> {
    let mapping = remote_store_kind(store.kind).ok_or_else(|| GenerateError::UnsupportedStoreKind {
        name: store.name.clone(),
        kind: store.kind.to_string(),
    })?;

    let mut annotation = format!("{} -> {}", store.kind, mapping.remote);
    if mapping.substituted {
        let warning = substitution_warning(&store.name, store.kind, mapping.remote);
        tracing::warn!("{}", warning);
        annotation = warning.clone();
        warnings.push(warning);
    }
    if let Some(parent) = &store.parent_name {
        annotation.push_str(&format!(" (database of {parent})"));
    }

    let payload = to_payload(&store.name, &store_request(store, mapping, ctx))?;
    Ok(Operation::post(
        mapping.remote.endpoint(),
        payload,
        &store.name,
        ResourceCategory::Store,
    )
    .with_annotation(annotation))
}
