// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod container_cache;

pub use container_cache::{ContainerCache, EcsContainer};
