// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log group name to resource ARN resolution.
//!
//! CloudWatch log group names only loosely encode the resource that produced
//! the logs, so resolution is heuristic. Patterns are tried top to bottom and
//! the first match wins:
//!
//! 1. `/aws/sagemaker/`, `sns/`, `/ecs/` and `/ec2/` have dedicated extractors.
//! 2. Everything else under `/aws/<service>/<resource>` goes through the
//!    generic extractor, which strips known noise suffixes and expands the
//!    resource name with the ARN templates known for the service.
//!
//! A single log group may yield several candidate ARNs when its shape is
//! ambiguous. Callers probe all of them.

use crate::tags::source::{build_resource_arn, ServiceInfo, TagSource};

const AWS_PREFIX: &str = "/aws/";
const SAGEMAKER_PREFIX: &str = "/aws/sagemaker/";
const SNS_PREFIX: &str = "sns/";
const ECS_PREFIX: &str = "/ecs/";
const EC2_PREFIX: &str = "/ec2/";

const LAMBDA_SERVICE: &str = "lambda";
const RDS_SERVICE: &str = "rds";
const RDS_ENGINES: [&str; 3] = ["mariadb", "mysql", "postgresql"];

/// Resource part prefixes for services whose ARN shape is known.
const RESOURCE_TEMPLATES: &[(&str, &[&str])] = &[
    ("lambda", &["function:"]),
    ("eks", &["cluster/"]),
    (
        "rds",
        &["cluster:", "instance:", "snapshot:", "pg:", "cluster-pg:"],
    ),
    ("emr-serverless", &["/applications/"]),
    ("codebuild", &["project/", "build/"]),
    ("codecatalyst", &["/connections/"]),
    ("codedeploy", &["application:", "instance:"]),
    ("firehose", &["deliverystream/"]),
    ("kinesis", &["stream/"]),
    ("docdb", &["cluster/"]),
    ("network-firewall", &["firewall"]),
    ("route53", &["hostedzone", "change"]),
    ("vpc", &[""]),
    ("cloudtrail", &["trail"]),
    ("msk", &["cluster"]),
    ("elasticsearch", &["es"]),
    ("transitgateway", &["tgw"]),
    ("verified-access", &["vpc"]),
];

/// Trailing log group segments that are not part of the resource name.
const NOISE_SUFFIXES: &[(&str, &str)] = &[("eks", "/cluster")];

/// The function a log group belongs to, when the log group is a Lambda one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFunction {
    pub arn: String,
    pub name: String,
}

/// Cluster, container and task of an ECS log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcsTaskSource {
    pub cluster: String,
    pub container: String,
    pub task: String,
}

/// Resolves the candidate resource ARNs of a log group.
///
/// Returns `None` when no pattern matches; callers skip source tags then.
#[must_use]
pub fn resolve(
    log_group: &str,
    log_stream: &str,
    account_id: &str,
    region: &str,
) -> Option<Vec<ServiceInfo>> {
    if let Some(rest) = non_empty_residual(log_group, SAGEMAKER_PREFIX) {
        return Some(vec![sagemaker(rest, log_stream, account_id, region)]);
    }
    if let Some(rest) = non_empty_residual(log_group, SNS_PREFIX) {
        return Some(vec![sns(rest, account_id, region)]);
    }
    if let Some(rest) = non_empty_residual(log_group, ECS_PREFIX) {
        return Some(ecs(rest, log_stream, account_id, region));
    }
    if let Some(rest) = non_empty_residual(log_group, EC2_PREFIX) {
        return Some(vec![ec2(rest, account_id, region)]);
    }
    generic(log_group, account_id, region)
}

/// Reports the function a `/aws/lambda/<name>` log group belongs to.
#[must_use]
pub fn resolve_self_if_managed_function(
    log_group: &str,
    account_id: &str,
    region: &str,
) -> Option<ManagedFunction> {
    let (service, name) = find_source(log_group)?;
    if service != LAMBDA_SERVICE {
        return None;
    }
    Some(ManagedFunction {
        arn: build_resource_arn(
            LAMBDA_SERVICE,
            account_id,
            region,
            &format!("function:{name}"),
        ),
        name,
    })
}

/// Extracts the ECS task of a `/ecs/<cluster>` log group with a
/// `<prefix>/<container>/<task>` log stream.
///
/// A non-empty `cluster_override` replaces the cluster taken from the log group.
#[must_use]
pub fn resolve_container_task(
    log_group: &str,
    log_stream: &str,
    cluster_override: Option<&str>,
) -> Option<EcsTaskSource> {
    let rest = non_empty_residual(log_group, ECS_PREFIX)?;
    let stream_parts = log_stream.split('/').collect::<Vec<&str>>();
    if stream_parts.len() != 3 {
        return None;
    }
    let cluster = match cluster_override {
        Some(cluster) if !cluster.is_empty() => cluster,
        _ => rest.split('/').next().unwrap_or(rest),
    };
    Some(EcsTaskSource {
        cluster: cluster.to_string(),
        container: stream_parts[1].to_string(),
        task: stream_parts[2].to_string(),
    })
}

fn non_empty_residual<'a>(log_group: &'a str, prefix: &str) -> Option<&'a str> {
    log_group
        .strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
}

/// Splits `/aws/<service>/<resource>` into its service and resource name.
///
/// RDS engine log groups (`/aws/rds/<engine>/<name>`) report the engine as
/// the service.
fn find_source(log_group: &str) -> Option<(String, String)> {
    let rest = log_group.strip_prefix(AWS_PREFIX)?;
    let (service, resource) = rest.split_once('/')?;
    if service.is_empty() || resource.is_empty() {
        return None;
    }
    if service == RDS_SERVICE {
        if let Some((engine, name)) = resource.split_once('/') {
            if RDS_ENGINES.contains(&engine) && !name.is_empty() {
                return Some((engine.to_string(), name.to_string()));
            }
        }
    }
    Some((service.to_string(), resource.to_string()))
}

fn resource_templates(service: &str) -> Option<&'static [&'static str]> {
    RESOURCE_TEMPLATES
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, templates)| *templates)
}

fn noise_suffix(service: &str) -> Option<&'static str> {
    NOISE_SUFFIXES
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, suffix)| *suffix)
}

fn generic(log_group: &str, account_id: &str, region: &str) -> Option<Vec<ServiceInfo>> {
    let (service, mut resource) = find_source(log_group)?;
    if let Some(suffix) = noise_suffix(&service) {
        if let Some(trimmed) = resource.strip_suffix(suffix) {
            resource = trimmed.to_string();
        }
    }

    let source = TagSource::from_name(&service);
    let services = match resource_templates(&service) {
        None => vec![ServiceInfo::new(
            source,
            build_resource_arn(&service, account_id, region, &resource),
        )],
        Some(templates) => templates
            .iter()
            .map(|template| {
                ServiceInfo::new(
                    source.clone(),
                    build_resource_arn(
                        &service,
                        account_id,
                        region,
                        &format!("{template}{resource}"),
                    ),
                )
            })
            .collect(),
    };
    Some(services)
}

fn sagemaker(group: &str, log_stream: &str, account_id: &str, region: &str) -> ServiceInfo {
    let group_parts = group.split('/').collect::<Vec<&str>>();
    let stream_parts = log_stream.split('/').collect::<Vec<&str>>();
    let has = |keyword: &str| group.contains(keyword);

    let resource = if has("CompilationJobs") {
        Some(format!("compilation-job/{log_stream}"))
    } else if has("Endpoints") && group_parts.len() == 2 {
        Some(format!("endpoint/{}", group_parts[1]))
    } else if has("LabelingJobs") {
        Some(format!("labeling-job/{}", stream_parts[0]))
    } else if stream_parts.len() == 2 {
        [
            ("InferenceRecommendationsJobs", "inference-recommendations-job"),
            ("NotebookInstances", "notebook-instance"),
            ("ProcessingJobs", "processing-job"),
            ("TrainingJobs", "training-job"),
        ]
        .iter()
        .find(|(keyword, _)| has(keyword))
        .map(|(_, kind)| format!("{kind}/{}", stream_parts[0]))
    } else {
        None
    };

    // sagemaker/<residual group> when the job type is unknown
    let resource = resource.unwrap_or_else(|| group.to_string());
    ServiceInfo::new(
        TagSource::Sagemaker,
        build_resource_arn("sagemaker", account_id, region, &resource),
    )
}

fn sns(group: &str, account_id: &str, region: &str) -> ServiceInfo {
    // <region>/<account_id>/<topic>[/Failure]
    let parts = group.split('/').collect::<Vec<&str>>();
    let topic = if parts.len() == 3 || parts.len() == 4 {
        parts[2]
    } else {
        group
    };
    ServiceInfo::new(
        TagSource::Sns,
        build_resource_arn("sns", account_id, region, topic),
    )
}

fn ecs(group: &str, log_stream: &str, account_id: &str, region: &str) -> Vec<ServiceInfo> {
    let group_parts = group.split('/').collect::<Vec<&str>>();
    let stream_parts = log_stream.split('/').collect::<Vec<&str>>();
    let cluster = group_parts[0];

    let mut services = Vec::with_capacity(3);
    if stream_parts.len() == 3 {
        services.push(ServiceInfo::new(
            TagSource::EcsTask,
            build_resource_arn(
                "ecs",
                account_id,
                region,
                &format!("task/{cluster}/{}", stream_parts[2]),
            ),
        ));
    }
    services.push(ServiceInfo::new(
        TagSource::EcsCluster,
        build_resource_arn("ecs", account_id, region, &format!("cluster/{cluster}")),
    ));
    if group_parts.len() == 2 {
        services.push(ServiceInfo::new(
            TagSource::EcsService,
            build_resource_arn(
                "ecs",
                account_id,
                region,
                &format!("service/{cluster}/{}", group_parts[1]),
            ),
        ));
    }
    services
}

fn ec2(group: &str, account_id: &str, region: &str) -> ServiceInfo {
    // <resource_type>/<id>, otherwise assume an instance id
    let parts = group.split('/').collect::<Vec<&str>>();
    let resource = if parts.len() == 2 {
        format!("{}/{}", parts[0], parts[1])
    } else {
        format!("instance/{group}")
    };
    ServiceInfo::new(
        TagSource::Ec2,
        build_resource_arn("ec2", account_id, region, &resource),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplicate::duplicate_item;

    const ACCOUNT: &str = "123456789012";
    const REGION: &str = "us-west-2";

    fn arns(group: &str, stream: &str) -> Vec<String> {
        resolve(group, stream, ACCOUNT, REGION)
            .expect("log group should resolve")
            .into_iter()
            .map(|s| s.arn)
            .collect()
    }

    #[duplicate_item(
        test_name                        group                                   svc                res;
        [test_find_source_lambda]        ["/aws/lambda/my-function"]             ["lambda"]         ["my-function"];
        [test_find_source_codebuild]     ["/aws/codebuild/my-project"]           ["codebuild"]      ["my-project"];
        [test_find_source_kinesis]       ["/aws/kinesis/my-stream"]              ["kinesis"]        ["my-stream"];
        [test_find_source_eks]           ["/aws/eks/my-cluster"]                 ["eks"]            ["my-cluster"];
        [test_find_source_docdb]         ["/aws/docdb/my-cluster"]               ["docdb"]          ["my-cluster"];
        [test_find_source_mariadb]       ["/aws/rds/mariadb/my-db"]              ["mariadb"]        ["my-db"];
        [test_find_source_mysql]         ["/aws/rds/mysql/my-db"]                ["mysql"]          ["my-db"];
        [test_find_source_postgresql]    ["/aws/rds/postgresql/my-db"]           ["postgresql"]     ["my-db"];
        [test_find_source_other_rds]     ["/aws/rds/other-db"]                   ["rds"]            ["other-db"];
        [test_find_source_unknown]       ["/aws/unknown-service/resource"]       ["unknown-service"] ["resource"];
        [test_find_source_nested]        ["/aws/unknown-service/resource/type"]  ["unknown-service"] ["resource/type"];
    )]
    #[test]
    fn test_name() {
        assert_eq!(
            find_source(group),
            Some((svc.to_string(), res.to_string()))
        );
    }

    #[test]
    fn test_find_source_not_found() {
        assert_eq!(find_source("/aws/"), None);
        assert_eq!(find_source("/aws/lambda/"), None);
        assert_eq!(find_source("/aws/lambda"), None);
        assert_eq!(find_source("custom-group"), None);
        assert_eq!(find_source("my-app/logs"), None);
    }

    #[test]
    fn test_resolve_lambda() {
        let services = resolve("/aws/lambda/my-fn", "2024/01/01/[$LATEST]abc", ACCOUNT, REGION)
            .expect("lambda log group should resolve");
        assert_eq!(
            services,
            vec![ServiceInfo::new(
                TagSource::Service("lambda".to_string()),
                "arn:aws:lambda:us-west-2:123456789012:function:my-fn".to_string()
            )]
        );
    }

    #[test]
    fn test_resolve_self_if_managed_function() {
        let function = resolve_self_if_managed_function("/aws/lambda/my-fn", ACCOUNT, REGION)
            .expect("lambda log group is a managed function");
        assert_eq!(function.name, "my-fn");
        assert_eq!(
            function.arn,
            "arn:aws:lambda:us-west-2:123456789012:function:my-fn"
        );
        // the managed function identity is one of the resolved candidates
        assert!(arns("/aws/lambda/my-fn", "").contains(&function.arn));
    }

    #[test]
    fn test_resolve_self_if_not_managed_function() {
        assert!(resolve_self_if_managed_function("/aws/kinesis/s", ACCOUNT, REGION).is_none());
        assert!(resolve_self_if_managed_function("/ecs/cluster", ACCOUNT, REGION).is_none());
        assert!(resolve_self_if_managed_function("/aws/lambda/", ACCOUNT, REGION).is_none());
    }

    #[test]
    fn test_resolve_not_found() {
        assert!(resolve("/aws/", "", ACCOUNT, REGION).is_none());
        assert!(resolve("custom-group", "", ACCOUNT, REGION).is_none());
        assert!(resolve("/ecs/", "", ACCOUNT, REGION).is_none());
    }

    #[test]
    fn test_resolve_expands_templates() {
        assert_eq!(
            arns("/aws/codebuild/my-project", ""),
            vec![
                "arn:aws:codebuild:us-west-2:123456789012:project/my-project",
                "arn:aws:codebuild:us-west-2:123456789012:build/my-project",
            ]
        );
        assert_eq!(arns("/aws/rds/other-db", "").len(), 5);
    }

    #[test]
    fn test_resolve_strips_noise_suffix() {
        assert_eq!(
            arns("/aws/eks/prod/cluster", ""),
            vec!["arn:aws:eks:us-west-2:123456789012:cluster/prod"]
        );
    }

    #[test]
    fn test_resolve_service_without_template() {
        let services = resolve("/aws/apigateway/welcome", "", ACCOUNT, REGION)
            .expect("generic log group should resolve");
        assert_eq!(
            services,
            vec![ServiceInfo::new(
                TagSource::Service("apigateway".to_string()),
                "arn:aws:apigateway:us-west-2:123456789012:welcome".to_string()
            )]
        );
    }

    #[test]
    fn test_resolve_ecs_with_task_stream_and_service() {
        let services = resolve("/ecs/prod/web", "ecs/app/0123456789abcdef", ACCOUNT, REGION)
            .expect("ecs log group should resolve");
        let sources = services.iter().map(|s| s.source.clone()).collect::<Vec<_>>();
        assert_eq!(
            sources,
            vec![
                TagSource::EcsTask,
                TagSource::EcsCluster,
                TagSource::EcsService
            ]
        );
        assert_eq!(
            services[0].arn,
            "arn:aws:ecs:us-west-2:123456789012:task/prod/0123456789abcdef"
        );
        assert_eq!(
            services[1].arn,
            "arn:aws:ecs:us-west-2:123456789012:cluster/prod"
        );
        assert_eq!(
            services[2].arn,
            "arn:aws:ecs:us-west-2:123456789012:service/prod/web"
        );
    }

    #[test]
    fn test_resolve_ecs_cluster_only() {
        assert_eq!(
            arns("/ecs/prod", "some-stream"),
            vec!["arn:aws:ecs:us-west-2:123456789012:cluster/prod"]
        );
    }

    #[test]
    fn test_resolve_ec2() {
        assert_eq!(
            arns("/ec2/vpc/vpc-123", ""),
            vec!["arn:aws:ec2:us-west-2:123456789012:vpc/vpc-123"]
        );
        assert_eq!(
            arns("/ec2/i-0abc", ""),
            vec!["arn:aws:ec2:us-west-2:123456789012:instance/i-0abc"]
        );
    }

    #[test]
    fn test_resolve_sns() {
        assert_eq!(
            arns("sns/us-west-2/123456789012/alerts", ""),
            vec!["arn:aws:sns:us-west-2:123456789012:alerts"]
        );
        assert_eq!(
            arns("sns/us-west-2/123456789012/alerts/Failure", ""),
            vec!["arn:aws:sns:us-west-2:123456789012:alerts"]
        );
        assert_eq!(
            arns("sns/alerts", ""),
            vec!["arn:aws:sns:us-west-2:123456789012:alerts"]
        );
    }

    #[duplicate_item(
        test_name                               group                                            stream                          expected;
        [test_sagemaker_compilation_job]        ["/aws/sagemaker/CompilationJobs"]               ["job-1"]                       ["compilation-job/job-1"];
        [test_sagemaker_endpoint]               ["/aws/sagemaker/Endpoints/my-endpoint"]         ["variant/i-1"]                 ["endpoint/my-endpoint"];
        [test_sagemaker_labeling_job]           ["/aws/sagemaker/LabelingJobs"]                  ["labels/part"]                 ["labeling-job/labels"];
        [test_sagemaker_inference_job]          ["/aws/sagemaker/InferenceRecommendationsJobs"]  ["rec-job/execution"]           ["inference-recommendations-job/rec-job"];
        [test_sagemaker_notebook]               ["/aws/sagemaker/NotebookInstances"]             ["nb/jupyter.log"]              ["notebook-instance/nb"];
        [test_sagemaker_processing_job]         ["/aws/sagemaker/ProcessingJobs"]                ["proc/algo-1"]                 ["processing-job/proc"];
        [test_sagemaker_training_job]           ["/aws/sagemaker/TrainingJobs"]                  ["train/algo-1"]                ["training-job/train"];
        [test_sagemaker_fallback]               ["/aws/sagemaker/TrainingJobs"]                  ["train"]                       ["TrainingJobs"];
    )]
    #[test]
    fn test_name() {
        assert_eq!(
            arns(group, stream),
            vec![format!("arn:aws:sagemaker:us-west-2:123456789012:{}", expected)]
        );
    }

    #[test]
    fn test_resolve_container_task() {
        assert_eq!(
            resolve_container_task("/ecs/prod/web", "ecs/app/task-id", None),
            Some(EcsTaskSource {
                cluster: "prod".to_string(),
                container: "app".to_string(),
                task: "task-id".to_string(),
            })
        );
    }

    #[test]
    fn test_resolve_container_task_with_cluster_override() {
        let task = resolve_container_task("/ecs/web", "ecs/app/task-id", Some("real-cluster"))
            .expect("ecs stream should resolve");
        assert_eq!(task.cluster, "real-cluster");

        let task = resolve_container_task("/ecs/web", "ecs/app/task-id", Some(""))
            .expect("ecs stream should resolve");
        assert_eq!(task.cluster, "web");
    }

    #[test]
    fn test_resolve_container_task_not_ecs() {
        assert!(resolve_container_task("/aws/lambda/fn", "ecs/app/task-id", None).is_none());
        assert!(resolve_container_task("/ecs/prod", "app/task-id", None).is_none());
    }
}
