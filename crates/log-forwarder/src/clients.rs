// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Remote lookups the enrichment pipeline depends on.
//!
//! Implementations backed by the AWS SDK live in the Lambda binary; the
//! pipeline only sees these traits.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::tags::Tags;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("task {task} not found in cluster {cluster}")]
    TaskNotFound { cluster: String, task: String },

    #[error("invocation cancelled")]
    Cancelled,

    #[error("invocation deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionConfiguration {
    pub runtime: Option<String>,
    pub version: Option<String>,
    pub memory_size: Option<i32>,
    pub architectures: Vec<String>,
}

/// One container of a described ECS task. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContainer {
    pub name: Option<String>,
    pub id: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
pub trait FunctionConfigClient: Send + Sync {
    async fn get_function_configuration(
        &self,
        function_arn: &str,
    ) -> Result<FunctionConfiguration, ClientError>;
}

#[async_trait]
pub trait ResourceTagClient: Send + Sync {
    /// Fetches the tags of every ARN in one batched call. ARNs without tags
    /// may be missing from the result.
    async fn get_resource_tags(&self, arns: &[String])
        -> Result<HashMap<String, Tags>, ClientError>;
}

#[async_trait]
pub trait TaskClient: Send + Sync {
    async fn describe_task(
        &self,
        cluster: &str,
        task: &str,
    ) -> Result<Vec<TaskContainer>, ClientError>;
}

/// Client used when a lookup is turned off: no tags, no containers and no
/// function configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpClient;

#[async_trait]
impl FunctionConfigClient for NoOpClient {
    async fn get_function_configuration(
        &self,
        function_arn: &str,
    ) -> Result<FunctionConfiguration, ClientError> {
        Err(ClientError::Remote(format!(
            "function configuration lookups are disabled, skipped {function_arn}"
        )))
    }
}

#[async_trait]
impl ResourceTagClient for NoOpClient {
    async fn get_resource_tags(
        &self,
        _arns: &[String],
    ) -> Result<HashMap<String, Tags>, ClientError> {
        Ok(HashMap::new())
    }
}

#[async_trait]
impl TaskClient for NoOpClient {
    async fn describe_task(
        &self,
        _cluster: &str,
        _task: &str,
    ) -> Result<Vec<TaskContainer>, ClientError> {
        Ok(Vec::new())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_client() {
        let client = NoOpClient;
        assert!(client
            .get_resource_tags(&["arn:aws:sns:us-east-1:1:t".to_string()])
            .await
            .expect("noop tags never fail")
            .is_empty());
        assert!(client
            .describe_task("cluster", "task")
            .await
            .expect("noop tasks never fail")
            .is_empty());
        assert!(client.get_function_configuration("arn").await.is_err());
    }

    #[test]
    fn test_task_not_found_display() {
        let error = ClientError::TaskNotFound {
            cluster: "prod".to_string(),
            task: "abc".to_string(),
        };
        assert_eq!(error.to_string(), "task abc not found in cluster prod");
    }
}
