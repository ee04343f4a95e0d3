// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log line format of the forwarder.
//!
//! Lines are prefixed with `FORWARDER` so they can be told apart from the
//! logs being forwarded when both end up in CloudWatch:
//!
//! ```text
//! FORWARDER | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```

use std::error::Error;
use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(&mut writer, "FORWARDER | {} | ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter directives for `log_level`, with the HTTP and TLS stacks muted.
#[must_use]
pub fn env_filter_directives(log_level: &str) -> String {
    format!("h2=off,hyper=off,rustls=off,aws_smithy_runtime=off,aws_config=warn,{log_level}")
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails when the level does not parse or a global subscriber is already set.
pub fn init(log_level: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing::subscriber::set_global_default(subscriber(log_level)?)?;
    Ok(())
}

fn subscriber(
    log_level: &str,
) -> Result<impl Subscriber + Send + Sync + 'static, Box<dyn Error + Send + Sync>> {
    Ok(tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter_directives(log_level))?)
        .event_format(Formatter)
        .finish())
}
