// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clients::{ClientError, TaskClient, TaskContainer};
use crate::context::InvocationContext;

/// Container metadata attached to ECS logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EcsContainer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl EcsContainer {
    #[must_use]
    pub fn named(name: &str) -> Self {
        EcsContainer {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl From<TaskContainer> for EcsContainer {
    fn from(container: TaskContainer) -> Self {
        EcsContainer {
            name: container.name.unwrap_or_default(),
            id: container.id.unwrap_or_default(),
            image: container.image.unwrap_or_default(),
            status: container.status.unwrap_or_default(),
        }
    }
}

type TaskKey = (String, String);

#[derive(Debug)]
struct CachedTask {
    matched: Option<EcsContainer>,
    containers: Vec<EcsContainer>,
    expires_at: Instant,
}

impl CachedTask {
    fn find(&self, wanted: &str) -> Option<EcsContainer> {
        match &self.matched {
            Some(container) if container.name == wanted => Some(container.clone()),
            _ => self.containers.iter().find(|c| c.name == wanted).cloned(),
        }
    }
}

/// TTL cache of described ECS tasks, keyed by cluster and task id.
///
/// Expired entries are refetched on read and removed by a background sweep
/// running every third of the TTL.
pub struct ContainerCache {
    client: Arc<dyn TaskClient>,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<TaskKey, CachedTask>>>,
    sweep: CancellationToken,
}

impl ContainerCache {
    #[must_use]
    pub fn new(client: Arc<dyn TaskClient>, ttl: Duration) -> Self {
        ContainerCache {
            client,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            sweep: CancellationToken::new(),
        }
    }

    /// Returns the container named `wanted`, if the task has one, and every
    /// container of the task.
    ///
    /// # Errors
    ///
    /// Fails when the task cannot be described or has no containers.
    pub async fn get_container(
        &self,
        ctx: &InvocationContext,
        cluster: &str,
        task: &str,
        wanted: &str,
    ) -> Result<(Option<EcsContainer>, Vec<EcsContainer>), ClientError> {
        let key = (cluster.to_string(), task.to_string());
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&key) {
                if Instant::now() < cached.expires_at {
                    return Ok((cached.find(wanted), cached.containers.clone()));
                }
            }
        }

        debug!("Describing ECS task {task} in cluster {cluster}");
        let described = ctx.run(self.client.describe_task(cluster, task)).await?;
        if described.is_empty() {
            return Err(ClientError::TaskNotFound {
                cluster: cluster.to_string(),
                task: task.to_string(),
            });
        }

        let containers = described
            .into_iter()
            .map(EcsContainer::from)
            .collect::<Vec<_>>();
        let matched = containers.iter().find(|c| c.name == wanted).cloned();

        self.entries.write().await.insert(
            key,
            CachedTask {
                matched: matched.clone(),
                containers: containers.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok((matched, containers))
    }

    /// Removes expired entries, returning how many were dropped.
    pub async fn sweep_expired(&self) -> usize {
        sweep(&self.entries).await
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Spawns the periodic sweep. Nothing is spawned for a TTL too small to
    /// give a sweep period.
    #[must_use]
    pub fn start_sweep(&self) -> Option<JoinHandle<()>> {
        let period = self.ttl / 3;
        if period.is_zero() {
            return None;
        }

        let entries = Arc::clone(&self.entries);
        let token = self.sweep.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = sweep(&entries).await;
                        if removed > 0 {
                            debug!("Swept {removed} expired ECS task entries");
                        }
                    }
                }
            }
            debug!("ECS container cache sweep stopped");
        }))
    }

    pub fn stop_sweep(&self) {
        self.sweep.cancel();
    }
}

async fn sweep(entries: &RwLock<HashMap<TaskKey, CachedTask>>) -> usize {
    let now = Instant::now();
    let mut entries = entries.write().await;
    let before = entries.len();
    entries.retain(|_, cached| cached.expires_at > now);
    before - entries.len()
}
