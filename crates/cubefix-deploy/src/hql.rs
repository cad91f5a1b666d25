//! Warehouse statement generation.
//!
//! Pure functions from descriptors to HQL text. Nothing here executes.

use std::path::Path;

use cubefix_core::TableDesc;

/// Map a declared column type to the warehouse's type name.
///
/// `varchar*` becomes `string`, `integer*` becomes `int`, and anything
/// else passes through. The result is always lower case.
pub fn hive_data_type(datatype: &str) -> String {
    let lower = datatype.to_lowercase();
    if lower.starts_with("varchar") {
        "string".to_string()
    } else if lower.starts_with("integer") {
        "int".to_string()
    } else {
        lower
    }
}

pub fn create_database_hql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database.to_uppercase())
}

/// Drop any table or view with the same identity, then create a
/// comma-delimited text table.
pub fn create_table_hql(table: &TableDesc) -> Vec<String> {
    let identity = table.identity();
    let drop_table = format!("DROP TABLE IF EXISTS {identity}");
    let drop_view = format!("DROP VIEW IF EXISTS {identity}");

    let mut ddl = String::new();
    ddl.push_str(&format!("CREATE TABLE {identity}\n"));
    ddl.push_str("(\n");
    for (i, col) in table.columns.iter().enumerate() {
        if i > 0 {
            ddl.push(',');
        }
        ddl.push_str(&format!("{} {}\n", col.name, hive_data_type(&col.datatype)));
    }
    ddl.push_str(")\n");
    ddl.push_str("ROW FORMAT DELIMITED FIELDS TERMINATED BY ','\n");
    ddl.push_str("STORED AS TEXTFILE");

    vec![drop_table, drop_view, ddl]
}

/// Bulk load `<dir>/<TABLE>.csv`, replacing existing table contents.
pub fn load_data_hql(table: &str, dir: &Path) -> String {
    format!(
        "LOAD DATA LOCAL INPATH '{}/{table}.csv' OVERWRITE INTO TABLE {table}",
        dir.display()
    )
}

/// Replace whatever `view` names with a view over `table`.
pub fn create_view_hql(view: &str, table: &str) -> Vec<String> {
    let view = view.to_uppercase();
    let table = table.to_uppercase();
    vec![
        format!("DROP VIEW IF EXISTS {view};\n"),
        format!("DROP TABLE IF EXISTS {view};\n"),
        format!("CREATE VIEW {view} AS SELECT * FROM {table};\n"),
    ]
}
