//! cubefix-deploy: test-fixture deployment for the cube-building system.
//!
//! Provisions sample metadata, generates synthetic tables, appends fact
//! data to the resource store, and loads everything into a Hive-like
//! warehouse so integration tests have a working dataset.
//!
//! All external effects go through two seams: [`CommandExecutor`] for
//! shell commands and [`WarehouseClient`] for warehouse statement batches.
//! Tests substitute a [`RecordingExecutor`] for both.

pub mod appender;
pub mod datagen;
pub mod deployer;
pub mod environment;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod hive;
pub mod hql;
pub mod streaming;

pub use appender::{AppendOutcome, FactTableAppender};
pub use datagen::{DataGenerator, GeneratedTable, GeneratedTables, ModelDataGenerator};
pub use deployer::{DeployReport, WarehouseTableDeployer};
pub use environment::{EnvironmentPreparer, MetadataReport};
pub use error::{DeployError, DeployResult};
pub use executor::{CommandExecutor, CommandOutput, RecordingExecutor, ShellExecutor};
pub use fixture::Fixture;
pub use hive::{CliWarehouseClient, HiveCmdBuilder, HiveCommand, WarehouseClient};
pub use streaming::{
    FileStreamLoader, MemoryStreamLoader, StreamDataLoader, StreamingTableDataGenerator,
    TimedJsonStreamParser,
};
