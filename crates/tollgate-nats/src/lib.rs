#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for client initialization and configuration.
pub const TRACING_TARGET_CLIENT: &str = "tollgate_nats::client";

/// Tracing target for key-value bucket and key operations.
pub const TRACING_TARGET_KV: &str = "tollgate_nats::kv";

/// Tracing target for connection establishment and reconnection.
pub const TRACING_TARGET_CONNECTION: &str = "tollgate_nats::connection";

mod client;
mod error;
pub mod kv;

pub use client::{NatsClient, NatsConfig, SessionStore};
pub use error::{Error, Result};
