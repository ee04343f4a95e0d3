// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clients::ResourceTagClient;
use crate::context::InvocationContext;
use crate::tags::Tags;

#[derive(Default)]
struct CacheState {
    /// Tags fetched per ARN.
    resources: HashMap<String, Tags>,
    /// Request keys already sent to the remote, successful or not.
    requested: HashSet<String>,
}

/// Process lifetime cache of resource tags.
///
/// Requests are keyed by the comma joined ARN list as given, so the same ARNs
/// in another order are a miss. A failed or empty fetch still marks its key as
/// requested and is never retried.
pub struct TagCache {
    client: Arc<dyn ResourceTagClient>,
    state: Mutex<CacheState>,
}

impl TagCache {
    #[must_use]
    pub fn new(client: Arc<dyn ResourceTagClient>) -> Self {
        TagCache {
            client,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the tags of every requested ARN that has any. Lookup errors are
    /// logged and yield an empty map.
    pub async fn get_tags(&self, ctx: &InvocationContext, arns: &[String]) -> HashMap<String, Tags> {
        if arns.is_empty() {
            return HashMap::new();
        }

        let key = arns.join(",");
        {
            let state = self.state.lock().await;
            if state.requested.contains(&key) || state.resources.contains_key(&key) {
                debug!("Tag cache hit for {key}");
                return collect(&state.resources, arns);
            }
        }

        debug!("Tag cache miss, fetching tags for {} resources", arns.len());
        let fetched = ctx.run(self.client.get_resource_tags(arns)).await;

        let mut state = self.state.lock().await;
        state.requested.insert(key);
        match fetched {
            Ok(tags) if !tags.is_empty() => {
                state.resources.extend(tags);
            }
            Ok(_) => {
                debug!("No tags found for {}", arns.join(","));
            }
            Err(e) => {
                warn!("Failed to fetch resource tags: {e}");
            }
        }
        collect(&state.resources, arns)
    }
}

fn collect(resources: &HashMap<String, Tags>, arns: &[String]) -> HashMap<String, Tags> {
    arns.iter()
        .filter_map(|arn| resources.get(arn).map(|tags| (arn.clone(), tags.clone())))
        .collect()
}
