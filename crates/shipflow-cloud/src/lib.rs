//! ShipFlow Cloud
//!
//! Turns an assembled [`shipflow_core::AppModel`] into resources on a remote
//! PaaS, either as a replayable shell script or by deploying directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  shipflow CLI                    │
//! │          (shipflow generate / deploy)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                shipflow-cloud                    │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │  generator   │  │  deploy (orchestrator)   │ │
//! │  └──────┬───────┘  └────────────┬─────────────┘ │
//! │         └──── payload / remap ──┘               │
//! │         trait PaasClient { ... }                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────┐
//! │       shipflow-cloud-paas       │
//! │        (HTTP client)            │
//! └─────────────────────────────────┘
//! ```

pub mod client;
pub mod deploy;
pub mod error;
pub mod generator;
pub mod payload;
pub mod remap;

// Re-exports
pub use client::{ApiResponse, CreatedResource, PaasClient, RemoteResource};
pub use deploy::{
    DeployConfig, DeployOptions, DeployResult, DeploymentSummary, ProgressSink, RepositorySource,
    TracingProgress, deploy,
};
pub use error::{CloudError, GenerateError, Result};
pub use generator::{GenerateOptions, GenerationResult, Operation, generate, render_script};
pub use payload::{ApplicationRequest, PayloadContext, ServiceRequest, StoreRequest};
pub use remap::{RemoteStoreKind, StoreMapping, remote_service_type, remote_store_kind};
