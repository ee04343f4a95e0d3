// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::logs::chunker::ChunkError;
use crate::logs::pusher::PushError;

/// Errors that abort a forwarder invocation.
///
/// Lookup failures never show up here; they are logged and the metadata is
/// left partially filled.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to chunk logs: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Failed to push chunk {chunk} of {total}: {source}")]
    Push {
        chunk: usize,
        total: usize,
        #[source]
        source: PushError,
    },
}
