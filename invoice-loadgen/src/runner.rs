//! Drives generators the way an external load-test engine would.
//!
//! The HTTP client, and with it the trust policy, is built once before any
//! virtual user starts. Each virtual user owns its own generator.

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::executor::RequestExecutor;
use crate::generator::RequestGenerator;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, instrument, warn};

/// Run the configured load test.
///
/// Returns the number of requests dispatched. Transport failures are logged
/// and skip their iteration; a generation error aborts the run.
///
/// # Errors
///
/// Returns [`RunnerError`] if the CA bundle cannot be read or the client
/// cannot be built, if a request cannot be generated, or if a virtual user
/// task fails.
#[instrument(skip(config), fields(
    virtual_users = config.virtual_users,
    iterations = config.iterations,
    trust_policy = %config.trust_policy,
))]
pub async fn run(config: &RunnerConfig) -> Result<u64, RunnerError> {
    let executor = Arc::new(RequestExecutor::new(&config.http_config()?)?);

    let mut users = JoinSet::new();
    for user in 0..config.virtual_users {
        let executor = Arc::clone(&executor);
        let generator = RequestGenerator::new(config.generator_config());
        let iterations = config.iterations;
        users.spawn(
            async move { run_virtual_user(user, &generator, &executor, iterations).await }
                .instrument(info_span!("virtual_user", user)),
        );
    }

    let mut dispatched = 0;
    let mut failure = None;
    while let Some(joined) = users.join_next().await {
        match joined {
            Ok(Ok(count)) => dispatched += count,
            Ok(Err(e)) => {
                if failure.is_none() {
                    users.abort_all();
                    failure = Some(e);
                }
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                if failure.is_none() {
                    users.abort_all();
                    failure = Some(RunnerError::Task(e.to_string()));
                }
            }
        }
    }

    if let Some(e) = failure {
        error!(error = %e, dispatched, "load test aborted");
        return Err(e);
    }

    info!(dispatched, "load test finished");
    Ok(dispatched)
}

async fn run_virtual_user(
    user: u32,
    generator: &RequestGenerator,
    executor: &RequestExecutor,
    iterations: u32,
) -> Result<u64, RunnerError> {
    let mut dispatched = 0;
    for iteration in 0..iterations {
        for request in generator.iteration() {
            let request = request?;
            dispatched += 1;
            match executor.execute(&request).await {
                Ok(status) => info!(user, iteration, %status, "request completed"),
                Err(e) => warn!(user, iteration, error = %e, retryable = e.is_retryable(), "request failed"),
            }
        }
    }
    Ok(dispatched)
}
