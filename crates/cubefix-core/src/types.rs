//! Metadata descriptors shared across cubefix crates.
//!
//! These mirror the subset of the cube-building system's metadata that the
//! fixture reads: table schemas, data models, and cube definitions. All
//! types are stored as JSON resources.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ── Tables ─────────────────────────────────────────────────────────

/// One column of a table descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDesc {
    pub id: String,
    pub name: String,
    /// Declared type, e.g. `varchar(256)`, `integer`, `decimal(19,4)`.
    pub datatype: String,
}

/// Schema of a single source table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDesc {
    pub name: String,
    #[serde(default = "default_database")]
    pub database: String,
    pub columns: Vec<ColumnDesc>,
}

fn default_database() -> String {
    crate::path::DEFAULT_DATABASE.to_string()
}

impl TableDesc {
    /// `DATABASE.NAME`, upper-cased.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.database, self.name).to_uppercase()
    }

    /// Find a column by name, ignoring case.
    pub fn find_column(&self, name: &str) -> Option<&ColumnDesc> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

// ── Models ─────────────────────────────────────────────────────────

/// Join between the fact table and a lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinDesc {
    /// Lookup-side key columns.
    pub primary_key: Vec<String>,
    /// Fact-side key columns, positionally matched to `primary_key`.
    pub foreign_key: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupDesc {
    /// Table identity (`DB.NAME`).
    pub table: String,
    pub join: JoinDesc,
}

/// Star-schema data model: one fact table plus its lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataModelDesc {
    pub name: String,
    pub fact_table: String,
    #[serde(default)]
    pub lookups: Vec<LookupDesc>,
}

impl DataModelDesc {
    /// Every table the model touches, lookups first, fact last.
    pub fn all_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self
            .lookups
            .iter()
            .map(|l| l.table.to_uppercase())
            .collect();
        tables.push(self.fact_table.to_uppercase());
        tables
    }
}

// ── Cubes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionDesc {
    pub name: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasureDesc {
    pub name: String,
    /// Aggregate expression, e.g. `SUM`, `COUNT_DISTINCT`.
    pub expression: String,
    #[serde(default)]
    pub parameter: Option<String>,
}

/// Cube definition. `signature` is a checksum over everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CubeDesc {
    pub name: String,
    pub model_name: String,
    #[serde(default)]
    pub dimensions: Vec<DimensionDesc>,
    #[serde(default)]
    pub measures: Vec<MeasureDesc>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl CubeDesc {
    /// Hex SHA-256 over the canonical JSON of this descriptor with the
    /// signature field cleared.
    pub fn calculate_signature(&self) -> String {
        let unsigned = CubeDesc {
            signature: None,
            ..self.clone()
        };
        // Serializing plain structs of strings and vecs cannot fail.
        let canonical = serde_json::to_vec(&unsigned).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    /// Whether the stored signature matches the current definition.
    pub fn check_signature(&self) -> bool {
        self.signature.as_deref() == Some(self.calculate_signature().as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeStatus {
    #[default]
    Disabled,
    Ready,
}

/// A built (or buildable) cube pointing at its descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CubeInstance {
    pub name: String,
    pub desc_name: String,
    #[serde(default)]
    pub status: CubeStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_upper_case() {
        let table = TableDesc {
            name: "test_cal_dt".to_string(),
            database: "edw".to_string(),
            columns: vec![],
        };
        assert_eq!(table.identity(), "EDW.TEST_CAL_DT");
    }

    #[test]
    fn test_database_defaults_when_absent() {
        let json = r#"{"name":"T","columns":[{"id":"1","name":"A","datatype":"integer"}]}"#;
        let table: TableDesc = serde_json::from_str(json).unwrap();
        assert_eq!(table.identity(), "DEFAULT.T");
        assert!(table.find_column("a").is_some());
    }

    #[test]
    fn test_model_all_tables_puts_fact_last() {
        let model = DataModelDesc {
            name: "m".to_string(),
            fact_table: "default.fact".to_string(),
            lookups: vec![LookupDesc {
                table: "edw.dim".to_string(),
                join: JoinDesc {
                    primary_key: vec!["ID".to_string()],
                    foreign_key: vec!["DIM_ID".to_string()],
                },
            }],
        };
        assert_eq!(model.all_tables(), vec!["EDW.DIM", "DEFAULT.FACT"]);
    }

    fn test_cube_desc() -> CubeDesc {
        CubeDesc {
            name: "test_cube".to_string(),
            model_name: "test_model".to_string(),
            dimensions: vec![DimensionDesc {
                name: "CAL_DT".to_string(),
                table: "DEFAULT.TEST_KYLIN_FACT".to_string(),
                column: "CAL_DT".to_string(),
            }],
            measures: vec![MeasureDesc {
                name: "GMV_SUM".to_string(),
                expression: "SUM".to_string(),
                parameter: Some("PRICE".to_string()),
            }],
            signature: None,
        }
    }

    #[test]
    fn test_signature_ignores_existing_signature() {
        let mut desc = test_cube_desc();
        let first = desc.calculate_signature();
        desc.signature = Some("stale".to_string());
        assert_eq!(desc.calculate_signature(), first);
        assert!(!desc.check_signature());

        desc.signature = Some(first);
        assert!(desc.check_signature());
    }

    #[test]
    fn test_signature_tracks_definition() {
        let desc = test_cube_desc();
        let mut changed = desc.clone();
        changed.measures[0].expression = "MAX".to_string();
        assert_ne!(desc.calculate_signature(), changed.calculate_signature());
        assert_eq!(desc.calculate_signature().len(), 64);
    }
}
