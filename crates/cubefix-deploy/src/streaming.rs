//! Streaming fixtures: timed JSON records, their CSV projection, and the
//! loaders that hand records to a stream broker.

use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use cubefix_core::TableDesc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::debug;

use crate::datagen::{ValueKind, random_value, value_kind};
use crate::error::{DeployError, DeployResult};

// ── Generation ─────────────────────────────────────────────────────

/// Generates JSON records for a fact table with event times spread
/// evenly over `[start, end)`.
pub struct StreamingTableDataGenerator {
    rng: StdRng,
    timestamp_field: String,
}

impl StreamingTableDataGenerator {
    pub fn new(seed: u64, timestamp_field: impl Into<String>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            timestamp_field: timestamp_field.into(),
        }
    }

    /// `count` records, one JSON object per record. Times are epoch millis.
    pub fn generate(
        &mut self,
        count: usize,
        start: u64,
        end: u64,
        table: &TableDesc,
    ) -> DeployResult<Vec<String>> {
        if end < start {
            return Err(DeployError::Generation(format!(
                "stream window ends ({end}) before it starts ({start})"
            )));
        }
        let span = end - start;
        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            let offset = (u128::from(span) * i as u128 / count as u128) as u64;
            let mut record = Map::new();
            for col in &table.columns {
                let raw = random_value(&mut self.rng, col);
                let value = match value_kind(&col.datatype) {
                    ValueKind::Integer => raw
                        .parse::<i64>()
                        .map(Value::from)
                        .unwrap_or(Value::String(raw)),
                    _ => Value::String(raw),
                };
                record.insert(col.name.clone(), value);
            }
            record.insert(self.timestamp_field.clone(), Value::from(start + offset));
            records.push(Value::Object(record).to_string());
        }
        Ok(records)
    }
}

// ── Parsing ────────────────────────────────────────────────────────

/// Projects a JSON record onto a fixed column order.
///
/// Field lookup ignores case. Missing or null fields become empty
/// strings; strings are taken raw and other values in JSON form.
pub struct TimedJsonStreamParser {
    columns: Vec<String>,
}

impl TimedJsonStreamParser {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn for_table(table: &TableDesc) -> Self {
        Self::new(table.columns.iter().map(|c| c.name.clone()).collect())
    }

    pub fn parse(&self, record: &[u8]) -> DeployResult<Vec<String>> {
        let value: Value = serde_json::from_slice(record)
            .map_err(|e| DeployError::InvalidRecord(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(DeployError::InvalidRecord(
                "expected a JSON object".to_string(),
            ));
        };
        let by_name: HashMap<String, &Value> = fields
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Ok(self
            .columns
            .iter()
            .map(|c| match by_name.get(&c.to_lowercase()) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect())
    }
}

// ── Loaders ────────────────────────────────────────────────────────

/// Accepts batches of serialized records for a streaming system.
pub trait StreamDataLoader: fmt::Display {
    fn load(&mut self, records: &[String]) -> DeployResult<()>;
}

/// Keeps every loaded record in memory.
#[derive(Debug, Default)]
pub struct MemoryStreamLoader {
    topic: String,
    records: Vec<String>,
}

impl MemoryStreamLoader {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }
}

impl StreamDataLoader for MemoryStreamLoader {
    fn load(&mut self, records: &[String]) -> DeployResult<()> {
        self.records.extend_from_slice(records);
        Ok(())
    }
}

impl fmt::Display for MemoryStreamLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory topic {}", self.topic)
    }
}

/// Appends records as JSON lines to `<dir>/<topic>.jsonl`.
#[derive(Debug, Clone)]
pub struct FileStreamLoader {
    path: PathBuf,
}

impl FileStreamLoader {
    pub fn new(dir: &Path, topic: &str) -> DeployResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{topic}.jsonl")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StreamDataLoader for FileStreamLoader {
    fn load(&mut self, records: &[String]) -> DeployResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for record in records {
            file.write_all(record.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;
        debug!(path = %self.path.display(), records = records.len(), "records written");
        Ok(())
    }
}

impl fmt::Display for FileStreamLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file topic {}", self.path.display())
    }
}
