pub mod anomaly;
pub mod stats;

use async_trait::async_trait;

use crate::alerter::webhook::WebhookChannel;
use crate::config::{DetectorConfig, StatsConfig, TriggerArgs};
use crate::error::Result;
use crate::host::CycleContext;
use crate::types::TableBatch;

/// A processing-engine plugin core. One instance handles one trigger; the
/// host invokes it once per WAL flush and invocations for the same trigger
/// never overlap.
#[async_trait]
pub trait Processor: Send {
    /// Human-readable name for this processor
    fn name(&self) -> &str;

    /// Consume one flush's table batches. Per-row failures are isolated
    /// inside; an `Err` here means the cycle could not run at all.
    async fn process_wal_flush(
        &mut self,
        ctx: &CycleContext<'_>,
        batches: &[TableBatch],
    ) -> Result<()>;
}

/// Build the rolling-statistics processor from trigger arguments.
pub fn create_stats_processor(args: &TriggerArgs) -> Result<stats::StatsProcessor> {
    let config = StatsConfig::from_args(args)?;
    Ok(stats::StatsProcessor::new(config))
}

/// Build the anomaly detector from trigger arguments, wired to a webhook
/// alert channel.
pub fn create_anomaly_processor(args: &TriggerArgs) -> Result<anomaly::AnomalyProcessor> {
    let config = DetectorConfig::from_args(args)?;
    let channel = WebhookChannel::new(&config.webhook_url);
    Ok(anomaly::AnomalyProcessor::new(config, Box::new(channel)))
}
