use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::alerter::{self, AlertChannel, AlertPayload, AlertType};
use crate::cache::{keys, CacheValue, StateCache};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::host::CycleContext;
use crate::types::{Row, TableBatch};
use crate::window::ValueWindow;
use super::Processor;

/// Standard deviations below this are treated as "no signal"; a constant
/// series must not divide by (near) zero.
const STDEV_EPSILON: f64 = 0.0001;

/// Sliding-window z-score anomaly detector for one (table, field) key.
///
/// The window of recent values and the last-alert instant live in the state
/// cache, so detection history spans invocations. Each incoming value is
/// appended to the window and scored against the mean and sample standard
/// deviation of the values that preceded it; a score above the threshold
/// raises an alert, subject to a cooldown per key.
pub struct AnomalyProcessor {
    config: DetectorConfig,
    channel: Box<dyn AlertChannel>,
    hostname: String,
}

impl AnomalyProcessor {
    pub fn new(config: DetectorConfig, channel: Box<dyn AlertChannel>) -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".into());
        Self { config, channel, hostname }
    }

    /// Load the persisted window, rebuilding empty when none exists or the
    /// configured size changed. A capacity change is a migration, not a
    /// reinterpretation: history under the old size is discarded.
    fn load_window(&self, cache: &dyn StateCache, key: &str) -> ValueWindow {
        match cache.get(key) {
            Some(CacheValue::Window(w)) if w.capacity() == self.config.window_size => w,
            Some(CacheValue::Window(w)) => {
                tracing::info!(
                    key,
                    old = w.capacity(),
                    new = self.config.window_size,
                    "window size changed, rebuilding empty"
                );
                ValueWindow::new(self.config.window_size)
            }
            _ => ValueWindow::new(self.config.window_size),
        }
    }

    fn evaluate(&self, window: &ValueWindow) -> Option<Candidate> {
        if window.len() < self.config.min_datapoints {
            return None;
        }
        let (previous, current) = window.split_latest()?;
        if previous.len() < 2 {
            return None;
        }

        let mean = previous.iter().sum::<f64>() / previous.len() as f64;
        let variance = previous.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (previous.len() - 1) as f64;
        let stdev = variance.sqrt();
        if stdev < STDEV_EPSILON {
            return None;
        }

        let z_score = (current - mean).abs() / stdev;
        if z_score > self.config.z_score_threshold {
            Some(Candidate { current, mean, stdev, z_score })
        } else {
            None
        }
    }

    fn payload(&self, candidate: &Candidate, row: &Row, now: DateTime<Utc>) -> AlertPayload {
        let direction = if candidate.current > candidate.mean { "increase" } else { "decrease" };
        let mut fields: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        fields.insert("current_value".into(), candidate.current.into());
        fields.insert("mean".into(), candidate.mean.into());
        fields.insert("stdev".into(), candidate.stdev.into());
        fields.insert("z_score".into(), candidate.z_score.into());
        fields.insert("threshold".into(), self.config.z_score_threshold.into());
        fields.insert("table".into(), self.config.table_name.clone().into());
        fields.insert("field".into(), self.config.field_name.clone().into());
        fields.insert("timestamp".into(), now.to_rfc3339().into());
        fields.insert("hostname".into(), self.hostname.clone().into());

        // Remaining row context: scalar fields and tags, minus the
        // monitored field and the timestamp.
        for (name, value) in &row.fields {
            if name == &self.config.field_name || fields.contains_key(name) {
                continue;
            }
            fields.insert(name.clone(), scalar_json(value));
        }
        for tag in &row.tags {
            if !fields.contains_key(&tag.key) {
                fields.insert(tag.key.clone(), tag.value.clone().into());
            }
        }

        AlertPayload {
            message: format!(
                "Anomaly detected: Sudden {} in {}",
                direction, self.config.field_name
            ),
            alert_type: AlertType::Warning,
            title: self.config.alert_title.clone(),
            fields,
        }
    }
}

struct Candidate {
    current: f64,
    mean: f64,
    stdev: f64,
    z_score: f64,
}

fn scalar_json(value: &crate::types::FieldValue) -> serde_json::Value {
    use crate::types::FieldValue;
    match value {
        FieldValue::Float(v) => (*v).into(),
        FieldValue::Int(v) => (*v).into(),
        FieldValue::UInt(v) => (*v).into(),
        FieldValue::Bool(v) => (*v).into(),
        FieldValue::Str(s) => s.clone().into(),
    }
}

#[async_trait]
impl Processor for AnomalyProcessor {
    fn name(&self) -> &str {
        "anomaly"
    }

    async fn process_wal_flush(
        &mut self,
        ctx: &CycleContext<'_>,
        batches: &[TableBatch],
    ) -> Result<()> {
        let window_key = keys::window(&self.config.table_name, &self.config.field_name);
        let alert_key = keys::last_alert(&self.config.table_name, &self.config.field_name);

        let mut window = self.load_window(ctx.cache, &window_key);
        let mut last_alert = match ctx.cache.get(&alert_key) {
            Some(CacheValue::Epoch(t)) => t,
            _ => 0.0,
        };
        let now_epoch = ctx.now.timestamp() as f64;

        for batch in batches {
            if batch.table_name != self.config.table_name {
                continue;
            }
            for row in &batch.rows {
                let Some(value) = row
                    .fields
                    .get(&self.config.field_name)
                    .and_then(|v| v.strict_f64())
                else {
                    continue;
                };

                window.push(value);

                let Some(candidate) = self.evaluate(&window) else { continue };
                if now_epoch - last_alert < self.config.cooldown_seconds as f64 {
                    tracing::debug!(
                        field = %self.config.field_name,
                        z_score = candidate.z_score,
                        "anomaly suppressed by cooldown"
                    );
                    continue;
                }

                let payload = self.payload(&candidate, row, ctx.now);
                alerter::dispatch(self.channel.as_ref(), &payload).await;

                // Cooldown clock starts at the dispatch attempt, sent or not.
                last_alert = now_epoch;
                ctx.cache.put(&alert_key, CacheValue::Epoch(last_alert));
            }
        }

        // Window state survives regardless of alert outcome.
        ctx.cache.put(&window_key, CacheValue::Window(window));
        Ok(())
    }
}
