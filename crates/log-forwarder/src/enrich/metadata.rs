// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The metadata header repeated at the top level of every chunk.

use serde::Serialize;

use crate::ecs::EcsContainer;
use crate::tags::Tags;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub cloud: Cloud,
    pub faas: Faas,
    pub aws: AwsCommon,
    #[serde(rename = "host.arch", skip_serializing_if = "String::is_empty")]
    pub host_arch: String,
    #[serde(rename = "process.runtime.name", skip_serializing_if = "String::is_empty")]
    pub runtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cloud {
    pub resource_id: String,
    pub account_id: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Faas {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub memory_size: String,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AwsCommon {
    #[serde(rename = "log.group.name")]
    pub log_group: String,
    #[serde(rename = "log.group.arn")]
    pub log_group_arn: String,
    #[serde(rename = "log.group.tags", skip_serializing_if = "Tags::is_empty")]
    pub log_group_tags: Tags,
    #[serde(rename = "log.stream.name")]
    pub log_stream: String,
    #[serde(rename = "log.message_type")]
    pub message_type: String,
    #[serde(rename = "log.subscription_filters")]
    pub subscription_filters: Vec<String>,
    #[serde(rename = "service.tags", skip_serializing_if = "Tags::is_empty")]
    pub service_tags: Tags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecs: Option<EcsInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EcsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<EcsContainer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub container_list: Vec<EcsContainer>,
}
