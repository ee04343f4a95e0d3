// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use tracing::warn;

use crate::logs::event::LogEvent;

/// Largest chunk a sink accepts.
pub const MAX_CHUNK_BYTES: usize = 1024 * 1024;

/// Recursion limit of the splitter. Ranges still too large at this depth are
/// emitted as they are.
pub const MAX_DEPTH: usize = 9;

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("metadata header is {header} bytes, larger than the {max} byte chunk limit")]
    HeaderTooLarge { header: usize, max: usize },

    #[error("failed to serialize chunk: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A serialized chunk ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub payload: Vec<u8>,
    pub event_count: usize,
    /// The payload is larger than the chunk limit.
    pub oversized: bool,
}

#[derive(Serialize)]
struct ChunkPayload<'a, H> {
    #[serde(flatten)]
    header: &'a H,
    #[serde(rename = "logEvents")]
    log_events: &'a [LogEvent],
}

/// Splits events into chunks that each carry the full metadata header.
#[derive(Debug)]
pub struct Chunker<'a, H> {
    max_bytes: usize,
    header: &'a H,
    events: &'a [LogEvent],
}

impl<'a, H: Serialize> Chunker<'a, H> {
    /// A `max_bytes` of zero or above [`MAX_CHUNK_BYTES`] means [`MAX_CHUNK_BYTES`].
    ///
    /// # Errors
    ///
    /// Fails when the header alone does not fit in `max_bytes`.
    pub fn new(max_bytes: usize, header: &'a H, events: &'a [LogEvent]) -> Result<Self, ChunkError> {
        let max_bytes = if max_bytes == 0 || max_bytes > MAX_CHUNK_BYTES {
            MAX_CHUNK_BYTES
        } else {
            max_bytes
        };

        let header_bytes = serde_json::to_vec(header)?.len();
        if header_bytes > max_bytes {
            return Err(ChunkError::HeaderTooLarge {
                header: header_bytes,
                max: max_bytes,
            });
        }

        Ok(Chunker {
            max_bytes,
            header,
            events,
        })
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns the chunks in event order. There is always at least one chunk,
    /// even for no events.
    ///
    /// # Errors
    ///
    /// Fails only when serialization fails.
    pub fn chunk_logs(&self) -> Result<Vec<Chunk>, ChunkError> {
        let mut chunks = Vec::new();
        self.split(0, self.events.len(), 0, &mut chunks)?;
        Ok(chunks)
    }

    fn split(
        &self,
        start: usize,
        end: usize,
        depth: usize,
        chunks: &mut Vec<Chunk>,
    ) -> Result<(), ChunkError> {
        let payload = serde_json::to_vec(&ChunkPayload {
            header: self.header,
            log_events: &self.events[start..end],
        })?;
        let event_count = end - start;

        if payload.len() <= self.max_bytes || event_count <= 1 || depth >= MAX_DEPTH {
            let oversized = payload.len() > self.max_bytes;
            if oversized {
                warn!(
                    "Chunk of {event_count} events is {} bytes, above the {} byte limit",
                    payload.len(),
                    self.max_bytes
                );
            }
            chunks.push(Chunk {
                payload,
                event_count,
                oversized,
            });
            return Ok(());
        }

        let mid = start + event_count / 2;
        self.split(start, mid, depth + 1, chunks)?;
        self.split(mid, end, depth + 1, chunks)
    }
}
