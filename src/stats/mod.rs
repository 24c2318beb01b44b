pub mod aggregate;
pub mod bucket;
pub mod distribution;

use std::collections::BTreeMap;

use crate::types::Row;
use aggregate::RunningAggregate;

/// Per-field accumulation for one cycle (or one time bucket): the mergeable
/// running aggregate plus the raw samples the distributional statistics
/// need. Samples are discarded with the accumulator at cycle end.
#[derive(Debug, Clone, Default)]
pub struct FieldAccumulator {
    pub agg: RunningAggregate,
    pub samples: Vec<f64>,
}

impl FieldAccumulator {
    pub fn observe(&mut self, value: f64) {
        self.agg.observe(value);
        self.samples.push(value);
    }
}

/// Field name → accumulator, filled by consuming rows. Non-numeric field
/// values are skipped without affecting other fields in the same row.
#[derive(Debug, Clone, Default)]
pub struct FieldAccumulators(pub BTreeMap<String, FieldAccumulator>);

impl FieldAccumulators {
    pub fn observe_row(&mut self, row: &Row) {
        for (name, value) in &row.fields {
            let Some(v) = value.coerce_f64() else { continue };
            if !v.is_finite() {
                continue;
            }
            self.0.entry(name.clone()).or_default().observe(v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
