//! HTTP client for the remote PaaS
//!
//! Implements [`shipflow_cloud::PaasClient`] against the control-plane REST API.
//!
//! # Requirements
//!
//! - `SHIPFLOW_API_URL` and `SHIPFLOW_API_TOKEN` env vars (or explicit [`PaasConfig`])
//!
//! # Example
//!
//! ```ignore
//! use shipflow_cloud::{DeployConfig, DeployOptions, deploy};
//! use shipflow_cloud_paas::{PaasApi, PaasConfig};
//!
//! let client = PaasApi::new(PaasConfig::from_env()?)?;
//! let summary = deploy(&client, &model, &config, DeployOptions::default()).await;
//! ```

pub mod client;

pub use client::{PaasApi, PaasConfig};
