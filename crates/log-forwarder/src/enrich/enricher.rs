// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::FunctionConfigClient;
use crate::config::Config;
use crate::context::InvocationContext;
use crate::ecs::{ContainerCache, EcsContainer};
use crate::enrich::metadata::{AwsCommon, Cloud, EcsInfo, Faas, Metadata};
use crate::proc::host_architecture;
use crate::tags::resolver::{self, ManagedFunction};
use crate::tags::{build_resource_arn, TagCache, TagSource, Tags};

/// Where a batch of logs came from.
#[derive(Debug, Clone, Copy)]
pub struct LogSource<'a> {
    pub account_id: &'a str,
    pub log_group: &'a str,
    pub log_stream: &'a str,
    pub message_type: &'a str,
    pub subscription_filters: &'a [String],
}

/// Builds the metadata header of an invocation.
///
/// Every lookup is best effort: failures are logged and leave their fields
/// empty.
pub struct Enricher {
    config: Arc<Config>,
    tag_cache: Arc<TagCache>,
    container_cache: Arc<ContainerCache>,
    functions: Arc<dyn FunctionConfigClient>,
}

impl Enricher {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        tag_cache: Arc<TagCache>,
        container_cache: Arc<ContainerCache>,
        functions: Arc<dyn FunctionConfigClient>,
    ) -> Self {
        Enricher {
            config,
            tag_cache,
            container_cache,
            functions,
        }
    }

    pub async fn build_metadata(&self, ctx: &InvocationContext, source: &LogSource<'_>) -> Metadata {
        let region = self.config.region.as_str();
        let forwarder_arn = ctx.invoked_function_arn.as_str();
        let log_group_arn = build_resource_arn(
            "logs",
            source.account_id,
            region,
            &format!("log-group:{}", source.log_group),
        );

        let mut arns = Vec::new();
        if self.config.forward_forwarder_tags && !forwarder_arn.is_empty() {
            arns.push(forwarder_arn.to_string());
        }
        if self.config.forward_log_group_tags {
            arns.push(log_group_arn.clone());
        }
        let mut categories = HashMap::new();
        if self.config.forward_source_tags {
            match resolver::resolve(source.log_group, source.log_stream, source.account_id, region) {
                Some(services) => {
                    for service in services {
                        arns.push(service.arn.clone());
                        categories.insert(service.arn, service.source);
                    }
                }
                None => debug!("No source resources resolved for log group {}", source.log_group),
            }
        }

        let mut faas = Faas {
            name: ctx.function_name.clone(),
            version: ctx.function_version.clone(),
            request_id: ctx.request_id.clone(),
            ..Default::default()
        };
        let mut host_arch = String::new();
        let mut runtime = String::new();

        let managed =
            resolver::resolve_self_if_managed_function(source.log_group, source.account_id, region);
        if let Some(function) = &managed {
            faas.name = function.name.clone();
            faas.version = String::new();
            match ctx
                .run(self.functions.get_function_configuration(&function.arn))
                .await
            {
                Ok(configuration) => {
                    if let Some(version) = configuration.version {
                        faas.version = version;
                    }
                    if let Some(memory_size) = configuration.memory_size {
                        faas.memory_size = memory_size.to_string();
                    }
                    runtime = configuration.runtime.unwrap_or_default();
                    host_arch = architecture(function, forwarder_arn, &configuration.architectures);
                }
                Err(e) => warn!(
                    "Failed to get function configuration for {}: {e}",
                    function.arn
                ),
            }
        }

        let fetched = self.tag_cache.get_tags(ctx, &arns).await;
        let prefixes = &self.config.source_tag_prefixes;

        let mut log_group_tags = Tags::new();
        if let Some(tags) = fetched.get(&log_group_arn) {
            prefixes.merge_into(&mut log_group_tags, &TagSource::LogGroup, tags);
        }
        if let Some(tags) = fetched.get(forwarder_arn) {
            prefixes.merge_into(&mut faas.tags, &TagSource::Forwarder, tags);
        }

        let is_source = |arn: &String| arn != forwarder_arn && *arn != log_group_arn;
        let mut service_tags = Tags::new();
        for arn in arns.iter().filter(|arn| is_source(arn)) {
            let (Some(tags), Some(category)) = (fetched.get(arn), categories.get(arn)) else {
                continue;
            };
            let target = if managed.is_some() {
                &mut faas.tags
            } else {
                &mut service_tags
            };
            prefixes.merge_into(target, category, tags);
        }

        let resource_id = arns
            .iter()
            .filter(|arn| is_source(arn))
            .find(|arn| fetched.get(*arn).is_some_and(|tags| !tags.is_empty()))
            .cloned()
            .unwrap_or_else(|| forwarder_arn.to_string());

        let ecs = self.ecs_info(ctx, source).await;

        Metadata {
            cloud: Cloud {
                resource_id,
                account_id: source.account_id.to_string(),
                region: region.to_string(),
            },
            faas,
            aws: AwsCommon {
                log_group: source.log_group.to_string(),
                log_group_arn,
                log_group_tags,
                log_stream: source.log_stream.to_string(),
                message_type: source.message_type.to_string(),
                subscription_filters: source.subscription_filters.to_vec(),
                service_tags,
                ecs,
            },
            host_arch,
            runtime,
        }
    }

    async fn ecs_info(&self, ctx: &InvocationContext, source: &LogSource<'_>) -> Option<EcsInfo> {
        let task = resolver::resolve_container_task(
            source.log_group,
            source.log_stream,
            self.config.ecs_cluster_override.as_deref(),
        )?;

        match self
            .container_cache
            .get_container(ctx, &task.cluster, &task.task, &task.container)
            .await
        {
            Ok((container, container_list)) => Some(EcsInfo {
                container,
                container_list,
            }),
            Err(e) => {
                warn!(
                    "Failed to describe container {} of task {} in cluster {}: {e}",
                    task.container, task.task, task.cluster
                );
                Some(EcsInfo {
                    container: Some(EcsContainer::named(&task.container)),
                    container_list: Vec::new(),
                })
            }
        }
    }
}

/// The function's own architectures, or the host's when the function is the
/// forwarder itself or reports none.
fn architecture(function: &ManagedFunction, forwarder_arn: &str, architectures: &[String]) -> String {
    if architectures.is_empty() || function.arn == forwarder_arn {
        host_architecture().to_string()
    } else {
        architectures.join(",")
    }
}
