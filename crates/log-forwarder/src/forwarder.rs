// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::clients::{FunctionConfigClient, ResourceTagClient, TaskClient};
use crate::config::Config;
use crate::context::InvocationContext;
use crate::ecs::ContainerCache;
use crate::enrich::{Enricher, LogSource};
use crate::error::ForwarderError;
use crate::logs::{Chunker, LogBatch, Pusher};
use crate::tags::TagCache;

/// Runs invocations end to end: enrich, chunk, then push every chunk in order.
///
/// The caches live as long as the forwarder and are shared by all invocations.
pub struct Forwarder {
    config: Arc<Config>,
    enricher: Enricher,
    container_cache: Arc<ContainerCache>,
    pusher: Pusher,
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl Forwarder {
    /// Builds the forwarder and starts the container cache sweep. Must be
    /// called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(
        config: Arc<Config>,
        functions: Arc<dyn FunctionConfigClient>,
        resource_tags: Arc<dyn ResourceTagClient>,
        tasks: Arc<dyn TaskClient>,
    ) -> Result<Self, ForwarderError> {
        let pusher = Pusher::new(&config.endpoint, config.push_timeout, config.retry_interval)
            .map_err(|e| ForwarderError::InvalidConfig(e.to_string()))?;
        Ok(Self::with_pusher(config, functions, resource_tags, tasks, pusher))
    }

    #[must_use]
    pub fn with_pusher(
        config: Arc<Config>,
        functions: Arc<dyn FunctionConfigClient>,
        resource_tags: Arc<dyn ResourceTagClient>,
        tasks: Arc<dyn TaskClient>,
        pusher: Pusher,
    ) -> Self {
        let tag_cache = Arc::new(TagCache::new(resource_tags));
        let container_cache = Arc::new(ContainerCache::new(
            tasks,
            config.ecs_container_cache_ttl,
        ));
        let sweep = container_cache.start_sweep();
        let enricher = Enricher::new(
            Arc::clone(&config),
            tag_cache,
            Arc::clone(&container_cache),
            functions,
        );

        Forwarder {
            config,
            enricher,
            container_cache,
            pusher,
            sweep: Mutex::new(sweep),
        }
    }

    /// Forwards one batch and returns how many chunks were delivered.
    ///
    /// # Errors
    ///
    /// Fails when the metadata header does not fit in a chunk or a chunk
    /// cannot be delivered before the invocation ends. Chunks after a failed
    /// one are not attempted.
    pub async fn forward(
        &self,
        ctx: &InvocationContext,
        batch: &LogBatch,
    ) -> Result<usize, ForwarderError> {
        let source = LogSource {
            account_id: &batch.owner,
            log_group: &batch.log_group,
            log_stream: &batch.log_stream,
            message_type: &batch.message_type,
            subscription_filters: &batch.subscription_filters,
        };
        let metadata = self.enricher.build_metadata(ctx, &source).await;

        let chunks =
            Chunker::new(self.config.max_chunk_bytes, &metadata, &batch.log_events)?.chunk_logs()?;
        let total = chunks.len();
        debug!(
            "Forwarding {} events from {} in {total} chunks",
            batch.log_events.len(),
            batch.log_group
        );

        for (index, chunk) in chunks.iter().enumerate() {
            if let Err(source) = self.pusher.push(ctx, &chunk.payload).await {
                error!(
                    "Failed to push chunk {} of {total} ({} events): {source}",
                    index + 1,
                    chunk.event_count
                );
                return Err(ForwarderError::Push {
                    chunk: index + 1,
                    total,
                    source,
                });
            }
        }

        info!(
            "Forwarded {} events from {} in {total} chunks",
            batch.log_events.len(),
            batch.log_group
        );
        Ok(total)
    }

    /// Stops the container cache sweep and waits for it to finish.
    pub async fn close(&self) {
        self.container_cache.stop_sweep();
        let sweep = self.sweep.lock().map(|mut sweep| sweep.take()).unwrap_or_default();
        if let Some(handle) = sweep {
            if let Err(e) = handle.await {
                error!("Container cache sweep ended abnormally: {e}");
            }
        }
    }
}
