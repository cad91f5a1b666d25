//! End-to-end fixture flow against an on-disk store.
//!
//! Seeds a reference metadata snapshot, deploys it, generates model data,
//! deploys warehouse tables through a recording executor, then layers a
//! streaming batch on top of the fact table.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cubefix_core::config::ViewConfig;
use cubefix_core::*;
use cubefix_deploy::*;
use cubefix_store::ResourceStore;

fn col(name: &str, datatype: &str) -> ColumnDesc {
    ColumnDesc {
        id: name.to_string(),
        name: name.to_string(),
        datatype: datatype.to_string(),
    }
}

fn write_json<T: serde::Serialize>(root: &Path, rel: &str, value: &T) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn write_snapshot(root: &Path) {
    let fact = TableDesc {
        name: "TEST_KYLIN_FACT".to_string(),
        database: "DEFAULT".to_string(),
        columns: vec![
            col("TRANS_ID", "bigint"),
            col("CAL_DT", "date"),
            col("LSTG_SITE_ID", "integer"),
            col("PRICE", "decimal(19,4)"),
        ],
    };
    let sites = TableDesc {
        name: "TEST_SITES".to_string(),
        database: "EDW".to_string(),
        columns: vec![col("SITE_ID", "integer"), col("SITE_NAME", "varchar(100)")],
    };
    write_json(root, "table/DEFAULT.TEST_KYLIN_FACT.json", &fact);
    write_json(root, "table/EDW.TEST_SITES.json", &sites);

    let model = DataModelDesc {
        name: "test_kylin_inner_join_model_desc".to_string(),
        fact_table: "DEFAULT.TEST_KYLIN_FACT".to_string(),
        lookups: vec![LookupDesc {
            table: "EDW.TEST_SITES".to_string(),
            join: JoinDesc {
                primary_key: vec!["SITE_ID".to_string()],
                foreign_key: vec!["LSTG_SITE_ID".to_string()],
            },
        }],
    };
    write_json(root, "model_desc/test_kylin_inner_join_model_desc.json", &model);

    let desc = CubeDesc {
        name: "test_streaming_table_cube_desc".to_string(),
        model_name: model.name.clone(),
        dimensions: vec![DimensionDesc {
            name: "SITE".to_string(),
            table: "EDW.TEST_SITES".to_string(),
            column: "SITE_NAME".to_string(),
        }],
        measures: vec![MeasureDesc {
            name: "GMV".to_string(),
            expression: "SUM".to_string(),
            parameter: Some("PRICE".to_string()),
        }],
        signature: None,
    };
    write_json(root, "cube_desc/test_streaming_table_cube_desc.json", &desc);
    write_json(
        root,
        "cube/test_streaming_table_cube.json",
        &CubeInstance {
            name: "test_streaming_table_cube".to_string(),
            desc_name: desc.name.clone(),
            status: CubeStatus::Disabled,
        },
    );
}

fn config(root: &Path) -> FixtureConfig {
    let mut config = FixtureConfig::scaffold(root);
    config.metadata.snapshot_dir = Some(root.join("snapshot"));
    config.fixture.tables = vec!["edw.test_sites".to_string(), "default.test_kylin_fact".to_string()];
    config.fixture.views = vec![ViewConfig {
        name: "edw.test_sites_view".to_string(),
        table: "edw.test_sites".to_string(),
    }];
    config.fixture.generated_rows = 100;
    config.fixture.seed = 11;
    config
}

#[test]
fn full_fixture_flow() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(&dir.path().join("snapshot"));
    let config = config(dir.path());

    let store = ResourceStore::open(&config.store.path).unwrap();
    let exec = Arc::new(RecordingExecutor::new());
    let fixture = Fixture::new(config, store.clone(), exec.clone());

    // Environment.
    fixture.environment().init_cli_work_dir().unwrap();
    let report = fixture.environment().deploy_metadata().unwrap();
    assert_eq!(report.copied, 5);
    assert_eq!(report.resigned_cubes, vec!["test_streaming_table_cube_desc"]);

    // Normal cubes: generate and deploy.
    let deployed = fixture
        .prepare_test_data_for_normal_cubes("test_kylin_inner_join_model_desc", false)
        .unwrap();
    assert_eq!(deployed.tables, vec!["EDW.TEST_SITES", "DEFAULT.TEST_KYLIN_FACT"]);
    assert_eq!(deployed.views, vec!["EDW.TEST_SITES_VIEW"]);

    let commands = exec.commands();
    assert!(commands[0].starts_with("rm -rf "));
    assert!(commands[1].starts_with("mkdir -p "));
    assert!(commands[2].contains("CREATE DATABASE IF NOT EXISTS EDW;"));
    assert!(commands[3].contains("CREATE TABLE EDW.TEST_SITES"));
    assert!(commands[4].contains("CREATE TABLE DEFAULT.TEST_KYLIN_FACT"));
    assert!(commands[4].contains("LSTG_SITE_ID int"));
    assert!(commands[5].contains("OVERWRITE INTO TABLE EDW.TEST_SITES"));
    assert!(commands[6].contains("OVERWRITE INTO TABLE DEFAULT.TEST_KYLIN_FACT"));
    assert!(commands[7].contains("CREATE VIEW EDW.TEST_SITES_VIEW AS SELECT * FROM EDW.TEST_SITES;"));
    assert_eq!(commands.len(), 8);

    let fact_path = "/data/DEFAULT.TEST_KYLIN_FACT.csv";
    let before = store.get_resource(fact_path).unwrap().unwrap();
    let before_text = String::from_utf8(before.content.clone()).unwrap();
    assert_eq!(before_text.lines().count(), 100);

    // Streaming cube: records go to the loader and get appended as CSV.
    let mut loader = MemoryStreamLoader::new("test_streaming_table_cube");
    let outcome = fixture
        .prepare_test_data_for_streaming_cube(0, 10_000, 25, "test_streaming_table_cube", &mut loader)
        .unwrap();
    assert_eq!(loader.records().len(), 25);
    assert_eq!(outcome.previous_bytes, before.content.len());

    let after = store.get_resource(fact_path).unwrap().unwrap();
    assert!(after.timestamp > before.timestamp);
    let after_text = String::from_utf8(after.content).unwrap();
    assert!(after_text.starts_with(&before_text));
    let appended: Vec<&str> = after_text[before_text.len()..].lines().collect();
    assert_eq!(appended.len(), 25);
    assert!(appended.iter().all(|l| l.split(',').count() == 4));
}

#[test]
fn provided_data_skips_generation() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot");
    write_snapshot(&snapshot);
    fs::create_dir_all(snapshot.join("data")).unwrap();
    fs::write(snapshot.join("data/EDW.TEST_SITES.csv"), "1,Site One\n").unwrap();
    fs::write(snapshot.join("data/DEFAULT.TEST_KYLIN_FACT.csv"), "1,2013-01-01,1,9.5000\n").unwrap();

    let config = config(dir.path());
    let store = ResourceStore::open_in_memory().unwrap();
    let fixture = Fixture::new(config, store.clone(), Arc::new(RecordingExecutor::new()));
    fixture.environment().deploy_metadata().unwrap();

    let report = fixture
        .prepare_test_data_for_normal_cubes("test_kylin_inner_join_model_desc", true)
        .unwrap();
    assert_eq!(report.staged_bytes, 11 + 22);

    let fact = store
        .get_resource("/data/DEFAULT.TEST_KYLIN_FACT.csv")
        .unwrap()
        .unwrap();
    assert_eq!(fact.content, b"1,2013-01-01,1,9.5000\n");
}
