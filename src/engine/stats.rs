use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::StatsConfig;
use crate::error::{HostError, Result};
use crate::host::{CycleContext, HostGateway, QueryRow};
use crate::record::Record;
use crate::stats::aggregate::RunningAggregate;
use crate::stats::{bucket, distribution, FieldAccumulators};
use crate::types::TableBatch;
use super::Processor;

/// Rolling-statistics processor.
///
/// Unbucketed, each cycle merges the batch with the previously persisted
/// aggregates and writes one record per field. With `time_sampling` set,
/// rows are grouped into fixed time windows instead and every cycle starts
/// fresh; bucketed aggregates never merge with prior state.
pub struct StatsProcessor {
    config: StatsConfig,
    analytics_table: String,
}

impl StatsProcessor {
    pub fn new(config: StatsConfig) -> Self {
        let analytics_table = config.analytics_table();
        Self { config, analytics_table }
    }

    async fn process_merged(&self, host: &dyn HostGateway, batch: &TableBatch) {
        let mut acc = FieldAccumulators::default();
        for row in &batch.rows {
            acc.observe_row(row);
        }
        if acc.is_empty() {
            return;
        }

        let prior = self.load_prior(host).await;

        for (field, current) in &acc.0 {
            let merged = prior
                .get(field.as_str())
                .unwrap_or(&RunningAggregate::default())
                .merge(&current.agg);
            let record = self.stat_record(field, &merged, &current.samples, None);
            self.write_record(host, record).await;
        }
    }

    async fn process_bucketed(
        &self,
        host: &dyn HostGateway,
        batch: &TableBatch,
        width: std::time::Duration,
    ) {
        for (start_ns, rows) in bucket::partition(&batch.rows, width) {
            let mut acc = FieldAccumulators::default();
            for row in rows {
                acc.observe_row(row);
            }
            for (field, current) in &acc.0 {
                let record = self.stat_record(field, &current.agg, &current.samples, Some(start_ns));
                self.write_record(host, record).await;
            }
        }
    }

    /// Fetch previously persisted aggregates. A missing analytics table is
    /// the normal empty-state start; any other failure is logged and the
    /// cycle continues unmerged.
    async fn load_prior(&self, host: &dyn HostGateway) -> BTreeMap<String, RunningAggregate> {
        let sql = format!("SELECT * FROM {}", self.analytics_table);
        match host.query(&sql).await {
            Ok(rows) => prior_from_rows(&rows),
            Err(HostError::NotFound) => {
                tracing::info!(table = %self.analytics_table, "no prior state, starting fresh");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::error!(table = %self.analytics_table, error = %e, "prior state query failed");
                BTreeMap::new()
            }
        }
    }

    fn stat_record(
        &self,
        field: &str,
        agg: &RunningAggregate,
        samples: &[f64],
        bucket_start_ns: Option<i64>,
    ) -> Record {
        let mut record = Record::new(&self.analytics_table)
            .tag("field_name", field)
            .float_field("min", agg.min)
            .float_field("max", agg.max)
            .float_field("mean", agg.mean());
        if let Some(m) = distribution::median(samples) {
            record = record.float_field("median", m);
        }
        if let Some(m) = distribution::mode(samples) {
            record = record.float_field("mode", m);
        }
        if let Some(p) = distribution::percentile_95(samples) {
            record = record.float_field("95th_percentile", p);
        }
        record = record.float_field("count", agg.count as f64);
        if let Some(ts) = bucket_start_ns {
            record = record.timestamp(ts);
        }
        record
    }

    async fn write_record(&self, host: &dyn HostGateway, record: Record) {
        if let Err(e) = host.write(record).await {
            tracing::error!(table = %self.analytics_table, error = %e, "record write failed");
        }
    }
}

/// Normalize prior-state query rows into aggregates, immediately at the
/// boundary. The persisted record carries count, mean, min and max; the sum
/// is reconstructed as mean * count. The last row per field wins.
fn prior_from_rows(rows: &[QueryRow]) -> BTreeMap<String, RunningAggregate> {
    let mut prior = BTreeMap::new();
    for row in rows {
        let Some(field) = row.get("field_name").and_then(|v| v.as_str()) else {
            continue;
        };
        let number = |key: &str| row.get(key).and_then(|v| v.as_f64());
        let (Some(count), Some(mean), Some(min), Some(max)) =
            (number("count"), number("mean"), number("min"), number("max"))
        else {
            tracing::warn!(field, "prior state row is missing aggregate columns");
            continue;
        };
        prior.insert(
            field.to_string(),
            RunningAggregate {
                count: count as u64,
                sum: mean * count,
                min,
                max,
            },
        );
    }
    prior
}

#[async_trait]
impl Processor for StatsProcessor {
    fn name(&self) -> &str {
        "stats"
    }

    async fn process_wal_flush(
        &mut self,
        ctx: &CycleContext<'_>,
        batches: &[TableBatch],
    ) -> Result<()> {
        for batch in batches {
            if batch.table_name != self.config.table_name {
                continue;
            }
            match self.config.time_sampling {
                Some(width) => self.process_bucketed(ctx.host, batch, width).await,
                None => self.process_merged(ctx.host, batch).await,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prior_rows_reconstruct_sum_from_mean() {
        let row: QueryRow = json!({
            "field_name": "usage",
            "count": 4.0,
            "mean": 2.5,
            "min": 1.0,
            "max": 5.0
        })
        .as_object()
        .unwrap()
        .clone();
        let prior = prior_from_rows(&[row]);
        let agg = &prior["usage"];
        assert_eq!(agg.count, 4);
        assert_eq!(agg.sum, 10.0);
        assert_eq!(agg.min, 1.0);
        assert_eq!(agg.max, 5.0);
    }

    #[test]
    fn later_prior_rows_win_and_partial_rows_are_skipped() {
        let rows: Vec<QueryRow> = [
            json!({"field_name": "usage", "count": 1.0, "mean": 1.0, "min": 1.0, "max": 1.0}),
            json!({"field_name": "usage", "count": 2.0, "mean": 3.0, "min": 2.0, "max": 4.0}),
            json!({"field_name": "broken", "count": 2.0}),
        ]
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();
        let prior = prior_from_rows(&rows);
        assert_eq!(prior.len(), 1);
        assert_eq!(prior["usage"].count, 2);
        assert_eq!(prior["usage"].sum, 6.0);
    }
}
