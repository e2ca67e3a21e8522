//! Invoice load generator - entry point.

use anyhow::Context;
use invoice_loadgen::RunnerConfig;
use loadgen_common::init_tracing;
use tracing::{Instrument, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RunnerConfig::from_env().context("invalid load test configuration")?;
    let root = init_tracing(&config.tracing_config());

    async {
        info!(
            virtual_users = config.virtual_users,
            iterations = config.iterations,
            trust_policy = %config.trust_policy,
            min_tls = %config.min_tls_version,
            "Starting invoice load test"
        );

        let dispatched = invoice_loadgen::run(&config).await?;
        info!(dispatched, "Invoice load test stopped");

        Ok::<(), anyhow::Error>(())
    }
    .instrument(root)
    .await
}
