// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod enricher;
pub mod metadata;

pub use enricher::{Enricher, LogSource};
pub use metadata::Metadata;
