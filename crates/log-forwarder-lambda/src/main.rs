// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod aws;

use std::sync::Arc;
use std::time::SystemTime;
use std::{env, time::Duration};

use aws_config::BehaviorVersion;
use aws_lambda_events::event::cloudwatch_logs::{LogData, LogsEvent};
use lambda_runtime::{service_fn, Context, LambdaEvent};
use tokio::time::Instant;
use tracing::{debug, error, info};

use log_forwarder::clients::{NoOpClient, ResourceTagClient};
use log_forwarder::logger;
use log_forwarder::logs::{LogBatch, LogEvent};
use log_forwarder::{Config, Forwarder, InvocationContext};

use crate::aws::{EcsClient, LambdaClient, TaggingClient};

const GRACE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let log_level = env::var("FORWARDER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());
    logger::init(&log_level)?;

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;

    let resource_tags: Arc<dyn ResourceTagClient> = if config.forwards_any_tags() {
        Arc::new(TaggingClient::new(&sdk_config))
    } else {
        debug!("Tag forwarding is disabled, skipping tag lookups");
        Arc::new(NoOpClient)
    };

    let forwarder = Arc::new(Forwarder::new(
        config,
        Arc::new(LambdaClient::new(&sdk_config)),
        resource_tags,
        Arc::new(EcsClient::new(&sdk_config)),
    )?);

    info!("Log forwarder started");
    let handler = {
        let forwarder = Arc::clone(&forwarder);
        service_fn(move |event: LambdaEvent<LogsEvent>| {
            let forwarder = Arc::clone(&forwarder);
            async move { handle(&forwarder, event).await }
        })
    };
    let result = lambda_runtime::run(handler).await;

    forwarder.close().await;
    result
}

async fn handle(
    forwarder: &Forwarder,
    event: LambdaEvent<LogsEvent>,
) -> Result<(), lambda_runtime::Error> {
    let ctx = invocation_context(&event.context, SystemTime::now());
    let batch = log_batch(event.payload.aws_logs.data);

    match forwarder.forward(&ctx, &batch).await {
        Ok(chunks) => {
            debug!("Invocation {} delivered {chunks} chunks", ctx.request_id);
            Ok(())
        }
        Err(e) => {
            error!("Invocation {} failed: {e}", ctx.request_id);
            Err(e.into())
        }
    }
}

/// Builds the invocation context, with the deadline moved ahead by the grace
/// period so the handler can return before the runtime kills it.
fn invocation_context(context: &Context, now: SystemTime) -> InvocationContext {
    let remaining = context.deadline().duration_since(now).unwrap_or_default();
    InvocationContext {
        request_id: context.request_id.clone(),
        invoked_function_arn: context.invoked_function_arn.clone(),
        function_name: context.env_config.function_name.clone(),
        function_version: context.env_config.version.clone(),
        ..Default::default()
    }
    .with_deadline(Instant::now() + remaining)
    .with_grace_period(GRACE_PERIOD)
}

fn log_batch(data: LogData) -> LogBatch {
    LogBatch {
        owner: data.owner,
        log_group: data.log_group,
        log_stream: data.log_stream,
        message_type: data.message_type,
        subscription_filters: data.subscription_filters,
        log_events: data
            .log_events
            .into_iter()
            .map(|entry| LogEvent {
                id: entry.id,
                timestamp: entry.timestamp,
                message: entry.message,
            })
            .collect(),
    }
}
