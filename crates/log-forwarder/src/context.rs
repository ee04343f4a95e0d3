// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::clients::ClientError;

/// Why an invocation stopped before its work finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    Cancelled,
    DeadlineExceeded,
}

impl From<Done> for ClientError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => ClientError::Cancelled,
            Done::DeadlineExceeded => ClientError::DeadlineExceeded,
        }
    }
}

/// Per invocation state every remote call is bound to.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub request_id: String,
    /// ARN of the function running the forwarder. Empty outside Lambda.
    pub invoked_function_arn: String,
    pub function_name: String,
    pub function_version: String,
    pub deadline: Option<Instant>,
    pub cancel: CancellationToken,
}

impl InvocationContext {
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Moves the deadline `grace` earlier so the invocation can report
    /// failures before the platform kills it.
    #[must_use]
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.deadline = self
            .deadline
            .map(|deadline| deadline.checked_sub(grace).unwrap_or(deadline));
        self
    }

    /// Time left before the deadline, `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Resolves once the invocation is cancelled or past its deadline.
    pub async fn done(&self) -> Done {
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Done::Cancelled,
            () = deadline => Done::DeadlineExceeded,
        }
    }

    /// Runs a remote call, giving up when the invocation ends first.
    pub async fn run<F, T>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        tokio::select! {
            biased;
            done = self.done() => Err(done.into()),
            result = call => result,
        }
    }
}
