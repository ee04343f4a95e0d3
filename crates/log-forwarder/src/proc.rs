// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Lambda architecture name of the host.
#[must_use]
pub fn host_architecture() -> &'static str {
    architecture_name(std::env::consts::ARCH)
}

fn architecture_name(arch: &str) -> &'static str {
    match arch {
        "aarch64" => "arm64",
        _ => "x86_64",
    }
}
