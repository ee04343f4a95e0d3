// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! AWS SDK backed implementations of the forwarder's lookup clients.

use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use tracing::debug;

use log_forwarder::clients::{
    ClientError, FunctionConfigClient, FunctionConfiguration, ResourceTagClient, TaskClient,
    TaskContainer,
};
use log_forwarder::tags::Tags;

fn remote<E: Error>(e: E) -> ClientError {
    ClientError::Remote(DisplayErrorContext(e).to_string())
}

pub struct LambdaClient {
    client: aws_sdk_lambda::Client,
}

impl LambdaClient {
    #[must_use]
    pub fn new(conf: &SdkConfig) -> Self {
        LambdaClient {
            client: aws_sdk_lambda::Client::new(conf),
        }
    }
}

#[async_trait]
impl FunctionConfigClient for LambdaClient {
    async fn get_function_configuration(
        &self,
        function_arn: &str,
    ) -> Result<FunctionConfiguration, ClientError> {
        let output = self
            .client
            .get_function_configuration()
            .function_name(function_arn)
            .send()
            .await
            .map_err(remote)?;

        Ok(FunctionConfiguration {
            runtime: output.runtime().map(|r| r.as_str().to_string()),
            version: output.version().map(str::to_string),
            memory_size: output.memory_size(),
            architectures: output
                .architectures()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        })
    }
}

pub struct TaggingClient {
    client: aws_sdk_resourcegroupstagging::Client,
}

impl TaggingClient {
    #[must_use]
    pub fn new(conf: &SdkConfig) -> Self {
        TaggingClient {
            client: aws_sdk_resourcegroupstagging::Client::new(conf),
        }
    }
}

#[async_trait]
impl ResourceTagClient for TaggingClient {
    async fn get_resource_tags(
        &self,
        arns: &[String],
    ) -> Result<HashMap<String, Tags>, ClientError> {
        let output = self
            .client
            .get_resources()
            .set_resource_arn_list(Some(arns.to_vec()))
            .send()
            .await
            .map_err(remote)?;

        let mut resources = HashMap::new();
        for mapping in output.resource_tag_mapping_list() {
            let Some(arn) = mapping.resource_arn() else {
                continue;
            };
            let tags: Tags = mapping
                .tags()
                .iter()
                .map(|t| (t.key().to_string(), t.value().to_string()))
                .collect();
            resources.insert(arn.to_string(), tags);
        }
        debug!(
            "Fetched tags for {} of {} resources",
            resources.len(),
            arns.len()
        );
        Ok(resources)
    }
}

pub struct EcsClient {
    client: aws_sdk_ecs::Client,
}

impl EcsClient {
    #[must_use]
    pub fn new(conf: &SdkConfig) -> Self {
        EcsClient {
            client: aws_sdk_ecs::Client::new(conf),
        }
    }
}

#[async_trait]
impl TaskClient for EcsClient {
    async fn describe_task(
        &self,
        cluster: &str,
        task: &str,
    ) -> Result<Vec<TaskContainer>, ClientError> {
        let output = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .tasks(task)
            .send()
            .await
            .map_err(remote)?;

        // An unknown task comes back as a failure entry, not as an error.
        let Some(described) = output.tasks().first() else {
            return Ok(Vec::new());
        };
        Ok(described
            .containers()
            .iter()
            .map(|c| TaskContainer {
                name: c.name().map(str::to_string),
                id: c.runtime_id().map(str::to_string),
                image: c.image().map(str::to_string),
                status: c.last_status().map(str::to_string),
            })
            .collect())
    }
}
