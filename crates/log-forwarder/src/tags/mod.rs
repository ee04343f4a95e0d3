// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod cache;
pub mod resolver;
pub mod source;

pub use cache::TagCache;
pub use source::{build_resource_arn, ServiceInfo, SourcePrefixes, TagSource, Tags};
