// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of the remote lookups for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log_forwarder::clients::{
    ClientError, FunctionConfigClient, FunctionConfiguration, ResourceTagClient, TaskClient,
    TaskContainer,
};
use log_forwarder::tags::Tags;

/// Mock tag client returning a fixed tag set for every request
#[derive(Default)]
pub struct MockTagClient {
    pub tags: HashMap<String, Tags>,
    pub calls: AtomicUsize,
}

impl MockTagClient {
    /// Builds the client from `(arn, key, value)` triples.
    pub fn with_tags(tags: &[(&str, &str, &str)]) -> Self {
        let mut by_arn: HashMap<String, Tags> = HashMap::new();
        for (arn, key, value) in tags {
            by_arn
                .entry((*arn).to_string())
                .or_default()
                .insert((*key).to_string(), (*value).to_string());
        }
        MockTagClient {
            tags: by_arn,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResourceTagClient for MockTagClient {
    async fn get_resource_tags(
        &self,
        arns: &[String],
    ) -> Result<HashMap<String, Tags>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(arns
            .iter()
            .filter_map(|arn| self.tags.get(arn).map(|tags| (arn.clone(), tags.clone())))
            .collect())
    }
}

/// Mock function client reporting a fixed configuration
pub struct MockFunctionClient {
    pub configuration: FunctionConfiguration,
}

#[async_trait::async_trait]
impl FunctionConfigClient for MockFunctionClient {
    async fn get_function_configuration(
        &self,
        _function_arn: &str,
    ) -> Result<FunctionConfiguration, ClientError> {
        Ok(self.configuration.clone())
    }
}

/// Mock task client for which every task is missing
pub struct MissingTaskClient;

#[async_trait::async_trait]
impl TaskClient for MissingTaskClient {
    async fn describe_task(
        &self,
        _cluster: &str,
        _task: &str,
    ) -> Result<Vec<TaskContainer>, ClientError> {
        Ok(Vec::new())
    }
}
