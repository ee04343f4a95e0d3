// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt;

/// Tag key to tag value.
pub type Tags = HashMap<String, String>;

/// Category of a resource whose tags are forwarded.
///
/// The category decides which tag map of the metadata a fetched tag set lands
/// in and which configured key prefix applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagSource {
    /// The function running the forwarder itself.
    Forwarder,
    LogGroup,
    Sagemaker,
    EcsTask,
    EcsCluster,
    EcsService,
    Ec2,
    Sns,
    /// Any service resolved through the generic `/aws/<service>/...` pattern.
    Service(String),
}

impl TagSource {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "forwarder" => Self::Forwarder,
            "log_group" => Self::LogGroup,
            "sagemaker" => Self::Sagemaker,
            "ecs_task" => Self::EcsTask,
            "ecs_cluster" => Self::EcsCluster,
            "ecs_service" => Self::EcsService,
            "ec2" => Self::Ec2,
            "sns" => Self::Sns,
            other => Self::Service(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Forwarder => "forwarder",
            Self::LogGroup => "log_group",
            Self::Sagemaker => "sagemaker",
            Self::EcsTask => "ecs_task",
            Self::EcsCluster => "ecs_cluster",
            Self::EcsService => "ecs_service",
            Self::Ec2 => "ec2",
            Self::Sns => "sns",
            Self::Service(name) => name,
        }
    }
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate resource identity: the category it belongs to and its ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub source: TagSource,
    pub arn: String,
}

impl ServiceInfo {
    #[must_use]
    pub fn new(source: TagSource, arn: String) -> Self {
        Self { source, arn }
    }
}

#[must_use]
pub fn build_resource_arn(service: &str, account_id: &str, region: &str, resource: &str) -> String {
    format!("arn:aws:{service}:{region}:{account_id}:{resource}")
}

/// Per category tag key prefixes.
///
/// Parsed from `category=prefix` pairs separated by commas, e.g.
/// `log_group=lg.,ecs_task=task.`. Malformed pairs are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePrefixes {
    prefixes: HashMap<TagSource, String>,
}

impl SourcePrefixes {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let prefixes = value
            .split(',')
            .filter_map(|pair| {
                let parts = pair.trim().split('=').collect::<Vec<&str>>();
                if parts.len() == 2 {
                    Some((
                        TagSource::from_name(parts[0].trim()),
                        parts[1].trim().to_string(),
                    ))
                } else {
                    None
                }
            })
            .collect();
        Self { prefixes }
    }

    #[must_use]
    pub fn get(&self, source: &TagSource) -> Option<&str> {
        self.prefixes.get(source).map(String::as_str)
    }

    /// Copies `tags` into `target`, prefixing each key with the prefix of `source`.
    pub fn merge_into(&self, target: &mut Tags, source: &TagSource, tags: &Tags) {
        let prefix = self.get(source).unwrap_or_default();
        for (k, v) in tags {
            target.insert(format!("{prefix}{k}"), v.clone());
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resource_arn() {
        assert_eq!(
            build_resource_arn("lambda", "123456789012", "us-east-1", "function:my-fn"),
            "arn:aws:lambda:us-east-1:123456789012:function:my-fn"
        );
    }

    #[test]
    fn test_tag_source_round_trips_names() {
        for name in [
            "forwarder",
            "log_group",
            "sagemaker",
            "ecs_task",
            "ecs_cluster",
            "ecs_service",
            "ec2",
            "sns",
            "kinesis",
        ] {
            assert_eq!(TagSource::from_name(name).as_str(), name);
        }
        assert_eq!(
            TagSource::from_name("lambda"),
            TagSource::Service("lambda".to_string())
        );
    }

    #[test]
    fn test_parse_prefixes() {
        let prefixes = SourcePrefixes::parse(" log_group = lg. , ecs_task=task., broken, a=b=c");
        assert_eq!(prefixes.get(&TagSource::LogGroup), Some("lg."));
        assert_eq!(prefixes.get(&TagSource::EcsTask), Some("task."));
        assert_eq!(prefixes.get(&TagSource::Forwarder), None);
        assert_eq!(prefixes.prefixes.len(), 2);
    }

    #[test]
    fn test_parse_empty_prefixes() {
        assert!(SourcePrefixes::parse("").is_empty());
    }

    #[test]
    fn test_merge_into_keeps_categories_apart() {
        let prefixes = SourcePrefixes::parse("ecs_task=task.,ecs_cluster=cluster.");
        let mut target = Tags::new();
        let task_tags = Tags::from([("team".to_string(), "payments".to_string())]);
        let cluster_tags = Tags::from([("team".to_string(), "platform".to_string())]);

        prefixes.merge_into(&mut target, &TagSource::EcsTask, &task_tags);
        prefixes.merge_into(&mut target, &TagSource::EcsCluster, &cluster_tags);

        assert_eq!(target.get("task.team").map(String::as_str), Some("payments"));
        assert_eq!(
            target.get("cluster.team").map(String::as_str),
            Some("platform")
        );
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_merge_into_without_prefix() {
        let prefixes = SourcePrefixes::default();
        let mut target = Tags::new();
        let tags = Tags::from([("env".to_string(), "prod".to_string())]);
        prefixes.merge_into(&mut target, &TagSource::Sns, &tags);
        assert_eq!(target, tags);
    }
}
