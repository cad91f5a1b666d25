//! Synthetic table data for star-schema models.
//!
//! Lookup tables are generated first with distinct key values; fact rows
//! then draw their foreign keys from those keys so every join resolves.
//! Output is seeded and therefore reproducible.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use cubefix_core::{ColumnDesc, DataModelDesc, ResourcePath, TableDesc};
use cubefix_store::{MetadataManager, now_millis};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{DeployError, DeployResult};

const MAX_LOOKUP_ROWS: u32 = 1000;
const DATE_SPAN_DAYS: u64 = 3 * 365;

/// Rows produced for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTable {
    /// Table identity (`DB.NAME`).
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl GeneratedTable {
    /// Comma-joined rows, each terminated by `\n`.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    pub fn column_values(&self, column: &str) -> Vec<&str> {
        match self.columns.iter().position(|c| c.eq_ignore_ascii_case(column)) {
            Some(i) => self.rows.iter().map(|r| r[i].as_str()).collect(),
            None => Vec::new(),
        }
    }
}

/// Every table of a model, lookups first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedTables {
    pub tables: Vec<GeneratedTable>,
}

impl GeneratedTables {
    pub fn get(&self, table: &str) -> Option<&GeneratedTable> {
        self.tables
            .iter()
            .find(|t| t.table.eq_ignore_ascii_case(table))
    }
}

/// Produces rows consistent with a model's schema.
pub trait DataGenerator {
    fn generate(&mut self, model: &DataModelDesc, rows: u32) -> DeployResult<GeneratedTables>;
}

/// Seeded random generator over the model's table descriptors.
pub struct ModelDataGenerator {
    metadata: MetadataManager,
    rng: StdRng,
}

impl ModelDataGenerator {
    pub fn new(metadata: MetadataManager, seed: u64) -> Self {
        Self {
            metadata,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `rows` fact rows for `model` and replace each table's
    /// `/data/<TABLE>.csv` with the result.
    pub fn generate_and_store(
        &mut self,
        model: &DataModelDesc,
        rows: u32,
    ) -> DeployResult<GeneratedTables> {
        let generated = self.generate(model, rows)?;
        let store = self.metadata.store();
        let stamp = now_millis();
        for table in &generated.tables {
            let path = ResourcePath::data(&table.table)?;
            store.put_resource(path.as_str(), table.to_csv().as_bytes(), stamp)?;
        }
        info!(
            model = %model.name,
            tables = generated.tables.len(),
            fact_rows = rows,
            "model data generated"
        );
        Ok(generated)
    }

    fn generate_lookup(&mut self, desc: &TableDesc, keys: &[String], rows: u32) -> GeneratedTable {
        let mut out = Vec::with_capacity(rows as usize);
        for i in 0..rows {
            let row = desc
                .columns
                .iter()
                .map(|col| {
                    if keys.iter().any(|k| k.eq_ignore_ascii_case(&col.name)) {
                        key_value(col, i)
                    } else {
                        random_value(&mut self.rng, col)
                    }
                })
                .collect();
            out.push(row);
        }
        GeneratedTable {
            table: desc.identity(),
            columns: desc.columns.iter().map(|c| c.name.clone()).collect(),
            rows: out,
        }
    }
}

impl DataGenerator for ModelDataGenerator {
    fn generate(&mut self, model: &DataModelDesc, rows: u32) -> DeployResult<GeneratedTables> {
        let fact = self.metadata.get_table_desc(&model.fact_table)?;
        let lookup_rows = (rows / 10).clamp(1, MAX_LOOKUP_ROWS);

        let mut tables = Vec::new();
        // fact column (upper) -> (lookup index, key position)
        let mut fk_sources: HashMap<String, (usize, usize)> = HashMap::new();
        let mut lookup_keys: Vec<Vec<Vec<String>>> = Vec::new();

        for (idx, lookup) in model.lookups.iter().enumerate() {
            let join = &lookup.join;
            if join.primary_key.len() != join.foreign_key.len() {
                return Err(DeployError::Generation(format!(
                    "join to {} has {} primary key columns but {} foreign key columns",
                    lookup.table,
                    join.primary_key.len(),
                    join.foreign_key.len()
                )));
            }
            let desc = self.metadata.get_table_desc(&lookup.table)?;
            let rows_for_lookup = key_cardinality(&desc, &join.primary_key)
                .map_or(lookup_rows, |max| lookup_rows.min(max));
            let generated = self.generate_lookup(&desc, &join.primary_key, rows_for_lookup);

            let mut key_tuples = vec![Vec::new(); generated.rows.len()];
            for pk in &join.primary_key {
                let values = generated.column_values(pk);
                if values.is_empty() {
                    return Err(DeployError::Generation(format!(
                        "primary key column {pk} not found in {}",
                        desc.identity()
                    )));
                }
                for (tuple, v) in key_tuples.iter_mut().zip(values) {
                    tuple.push(v.to_string());
                }
            }
            for (pos, fk) in join.foreign_key.iter().enumerate() {
                fk_sources.insert(fk.to_uppercase(), (idx, pos));
            }
            lookup_keys.push(key_tuples);
            tables.push(generated);
        }

        let mut fact_rows = Vec::with_capacity(rows as usize);
        for _ in 0..rows {
            // One key tuple per lookup per row keeps composite keys aligned.
            let picks: Vec<usize> = lookup_keys
                .iter()
                .map(|keys| self.rng.gen_range(0..keys.len()))
                .collect();
            let row = fact
                .columns
                .iter()
                .map(|col| match fk_sources.get(&col.name.to_uppercase()) {
                    Some(&(idx, pos)) => lookup_keys[idx][picks[idx]][pos].clone(),
                    None => random_value(&mut self.rng, col),
                })
                .collect();
            fact_rows.push(row);
        }
        tables.push(GeneratedTable {
            table: fact.identity(),
            columns: fact.columns.iter().map(|c| c.name.clone()).collect(),
            rows: fact_rows,
        });

        Ok(GeneratedTables { tables })
    }
}

// ── Values ─────────────────────────────────────────────────────────

/// Broad type family of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Integer,
    Decimal { scale: usize },
    Date,
    Timestamp,
    Boolean,
    Text { max_len: usize },
}

pub(crate) fn value_kind(datatype: &str) -> ValueKind {
    let lower = datatype.trim().to_lowercase();
    let base = lower.split('(').next().unwrap_or_default().trim();
    match base {
        "tinyint" | "smallint" | "int" | "integer" | "bigint" | "long" => ValueKind::Integer,
        "decimal" | "numeric" => ValueKind::Decimal {
            scale: type_args(&lower).get(1).copied().unwrap_or(2),
        },
        "double" | "float" | "real" => ValueKind::Decimal { scale: 4 },
        "date" => ValueKind::Date,
        "timestamp" | "datetime" => ValueKind::Timestamp,
        "boolean" | "bool" => ValueKind::Boolean,
        _ => ValueKind::Text {
            max_len: type_args(&lower).first().copied().unwrap_or(16).clamp(1, 16),
        },
    }
}

/// Numeric arguments of `name(a,b)`.
fn type_args(datatype: &str) -> Vec<usize> {
    match (datatype.find('('), datatype.rfind(')')) {
        (Some(open), Some(close)) if open < close => datatype[open + 1..close]
            .split(',')
            .filter_map(|a| a.trim().parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Upper bound on distinct key tuples, if the key columns impose one.
/// Boolean keys only take two values; any other key column is unbounded.
fn key_cardinality(desc: &TableDesc, keys: &[String]) -> Option<u32> {
    let all_boolean = keys.iter().all(|k| {
        desc.find_column(k)
            .is_some_and(|c| value_kind(&c.datatype) == ValueKind::Boolean)
    });
    (all_boolean && !keys.is_empty()).then_some(2)
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or_default()
}

/// Deterministic, distinct value for row `i` of a key column.
pub(crate) fn key_value(col: &ColumnDesc, i: u32) -> String {
    match value_kind(&col.datatype) {
        ValueKind::Integer => (i + 1).to_string(),
        ValueKind::Decimal { scale } => format!("{:.*}", scale, f64::from(i + 1)),
        ValueKind::Date => base_date()
            .checked_add_days(Days::new(u64::from(i)))
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string(),
        ValueKind::Timestamp => base_date()
            .checked_add_days(Days::new(u64::from(i)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        ValueKind::Boolean => (i % 2 == 0).to_string(),
        ValueKind::Text { .. } => format!("{}{}", col.name.to_uppercase(), i + 1),
    }
}

/// Random value matching the column's type. Never contains a comma.
pub(crate) fn random_value<R: Rng>(rng: &mut R, col: &ColumnDesc) -> String {
    match value_kind(&col.datatype) {
        ValueKind::Integer => rng.gen_range(0..1000).to_string(),
        ValueKind::Decimal { scale } => format!("{:.*}", scale, rng.gen_range(0.0..1000.0)),
        ValueKind::Date => base_date()
            .checked_add_days(Days::new(rng.gen_range(0..DATE_SPAN_DAYS)))
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string(),
        ValueKind::Timestamp => base_date()
            .checked_add_days(Days::new(rng.gen_range(0..DATE_SPAN_DAYS)))
            .and_then(|d| {
                d.and_hms_opt(
                    rng.gen_range(0..24),
                    rng.gen_range(0..60),
                    rng.gen_range(0..60),
                )
            })
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        ValueKind::Boolean => rng.gen_bool(0.5).to_string(),
        ValueKind::Text { max_len } => {
            let len = rng.gen_range(1..=max_len);
            rng.sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        }
    }
}
