// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod backoff;
pub mod chunker;
pub mod event;
pub mod pusher;

pub use chunker::{Chunk, ChunkError, Chunker, MAX_CHUNK_BYTES};
pub use event::{LogBatch, LogEvent};
pub use pusher::{PushError, Pusher};
