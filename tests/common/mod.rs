#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use walstats::alerter::{AlertChannel, AlertPayload};
use walstats::error::HostError;
use walstats::host::{HostGateway, QueryRow};
use walstats::record::Record;

/// Route engine logs to the test output when RUST_LOG is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How the mock host answers prior-state queries
pub enum QueryBehavior {
    Rows(Vec<QueryRow>),
    NotFound,
    Unavailable,
}

/// Host gateway double: canned query behavior, captured writes.
pub struct MockHost {
    behavior: QueryBehavior,
    pub written: Mutex<Vec<Record>>,
    pub queries: Mutex<Vec<String>>,
}

impl MockHost {
    pub fn with_rows(rows: Vec<QueryRow>) -> Self {
        Self::new(QueryBehavior::Rows(rows))
    }

    pub fn not_found() -> Self {
        Self::new(QueryBehavior::NotFound)
    }

    pub fn unavailable() -> Self {
        Self::new(QueryBehavior::Unavailable)
    }

    fn new(behavior: QueryBehavior) -> Self {
        init_tracing();
        Self {
            behavior,
            written: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn written_records(&self) -> Vec<Record> {
        self.written.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl HostGateway for MockHost {
    async fn query(&self, sql: &str) -> Result<Vec<QueryRow>, HostError> {
        self.queries.lock().unwrap().push(sql.to_string());
        match &self.behavior {
            QueryBehavior::Rows(rows) => Ok(rows.clone()),
            QueryBehavior::NotFound => Err(HostError::NotFound),
            QueryBehavior::Unavailable => {
                Err(HostError::Unavailable("connection refused".to_string()))
            }
        }
    }

    async fn write(&self, record: Record) -> Result<(), HostError> {
        self.written.lock().unwrap().push(record);
        Ok(())
    }
}

/// Alert channel double. Captures payloads; optionally fails every send.
pub struct CapturingChannel {
    pub sent: Arc<Mutex<Vec<AlertPayload>>>,
    fail: bool,
}

impl CapturingChannel {
    pub fn new() -> (Self, Arc<Mutex<Vec<AlertPayload>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (Self { sent: sent.clone(), fail: false }, sent)
    }

    pub fn failing() -> (Self, Arc<Mutex<Vec<AlertPayload>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (Self { sent: sent.clone(), fail: true }, sent)
    }
}

#[async_trait]
impl AlertChannel for CapturingChannel {
    fn name(&self) -> &str {
        "capturing"
    }

    async fn send(&self, payload: &AlertPayload) -> Result<()> {
        if self.fail {
            anyhow::bail!("endpoint down");
        }
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}
