use std::sync::{Arc, Mutex};

use crate::translate::{LogRecord, Severity};

/// Destination for per-invocation link records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Forwards records to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn emit(&self, record: &LogRecord) {
        let outcome = record.tag.as_str();
        let student_id = record.correlation_id.as_deref().unwrap_or("-");
        let detail = record.detail.as_deref().unwrap_or("");
        match record.severity {
            Severity::Info => {
                tracing::info!(outcome, student_id, detail, "telegram link attempt finished")
            }
            Severity::Warn => {
                tracing::warn!(outcome, student_id, detail, "telegram link attempt failed")
            }
            Severity::Error => tracing::error!(
                outcome,
                student_id,
                detail,
                "telegram link attempt failed; operator action required"
            ),
        }
    }
}

/// Keeps records in memory; handy for tests and for embedding in other runtimes.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for MemoryLogSink {
    fn emit(&self, record: &LogRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::OutcomeTag;

    #[test]
    fn memory_sink_collects_records_across_clones() {
        let sink = MemoryLogSink::new();
        let clone = sink.clone();
        clone.emit(&LogRecord {
            severity: Severity::Warn,
            tag: OutcomeTag::Timeout,
            correlation_id: Some("student-1".into()),
            detail: None,
        });
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag, OutcomeTag::Timeout);
    }

    #[test]
    fn tracing_sink_accepts_every_severity() {
        let sink = TracingLogSink;
        for severity in [Severity::Info, Severity::Warn, Severity::Error] {
            sink.emit(&LogRecord {
                severity,
                tag: OutcomeTag::Success,
                correlation_id: None,
                detail: Some("ok".into()),
            });
        }
    }
}
