// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Log Forwarder
//!
//! Enriches CloudWatch Logs subscription batches with ownership metadata and
//! delivers them to a single HTTP sink.
//!
//! ## Pipeline
//!
//! ```text
//!   LogBatch ──> Enricher ──> Chunker ──> Pusher ──> sink
//!                   │
//!        ┌──────────┼───────────────┐
//!        v          v               v
//!   resolver    TagCache     ContainerCache
//! ```
//!
//! - [`tags`]: log group to resource ARN resolution and the tag cache
//! - [`ecs`]: the TTL container metadata cache and its background sweep
//! - [`enrich`]: the metadata record attached to every chunk
//! - [`logs`]: input events, size-bounded chunking and delivery
//! - [`forwarder`]: one invocation end to end
//!
//! Remote lookups go through the traits in [`clients`] so the pipeline can run
//! against AWS or against test doubles.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod clients;
pub mod config;
pub mod context;
pub mod ecs;
pub mod enrich;
pub mod error;
pub mod forwarder;
pub mod http;
pub mod logger;
pub mod logs;
pub mod proc;
pub mod tags;

pub use config::Config;
pub use context::InvocationContext;
pub use error::ForwarderError;
pub use forwarder::Forwarder;
