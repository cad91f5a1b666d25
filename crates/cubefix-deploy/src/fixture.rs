//! Fixture entry points used by integration test harnesses.
//!
//! A [`Fixture`] owns the configuration and the collaborators and hands
//! out the individual components wired to them.

use std::sync::Arc;

use cubefix_core::FixtureConfig;
use cubefix_store::{MetadataManager, ResourceStore};
use tracing::info;

use crate::appender::{AppendOutcome, FactTableAppender};
use crate::datagen::ModelDataGenerator;
use crate::deployer::{DeployReport, WarehouseTableDeployer};
use crate::environment::EnvironmentPreparer;
use crate::error::DeployResult;
use crate::executor::CommandExecutor;
use crate::hive::{CliWarehouseClient, WarehouseClient};
use crate::streaming::{StreamDataLoader, StreamingTableDataGenerator, TimedJsonStreamParser};

pub struct Fixture {
    config: FixtureConfig,
    metadata: MetadataManager,
    executor: Arc<dyn CommandExecutor>,
    warehouse: Arc<dyn WarehouseClient>,
}

impl Fixture {
    /// Wire a fixture whose warehouse statements go through `executor`
    /// as warehouse CLI invocations.
    pub fn new(
        config: FixtureConfig,
        store: ResourceStore,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let warehouse = Arc::new(CliWarehouseClient::new(
            executor.clone(),
            config.warehouse.clone(),
        ));
        Self::with_warehouse(config, store, executor, warehouse)
    }

    pub fn with_warehouse(
        config: FixtureConfig,
        store: ResourceStore,
        executor: Arc<dyn CommandExecutor>,
        warehouse: Arc<dyn WarehouseClient>,
    ) -> Self {
        Self {
            config,
            metadata: MetadataManager::new(store),
            executor,
            warehouse,
        }
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataManager {
        &self.metadata
    }

    pub fn environment(&self) -> EnvironmentPreparer {
        EnvironmentPreparer::new(
            self.executor.clone(),
            self.metadata.clone(),
            self.config.env.clone(),
            self.config.metadata.snapshot_dir.clone(),
        )
    }

    pub fn appender(&self) -> FactTableAppender {
        FactTableAppender::new(self.metadata.store().clone())
    }

    pub fn deployer(&self) -> WarehouseTableDeployer {
        WarehouseTableDeployer::new(
            self.metadata.clone(),
            self.warehouse.clone(),
            self.executor.clone(),
            self.config.warehouse.clone(),
            &self.config.fixture,
        )
    }

    pub fn data_generator(&self) -> ModelDataGenerator {
        ModelDataGenerator::new(self.metadata.clone(), self.config.fixture.seed)
    }

    /// Generate random data for `model_name` (unless the store already
    /// holds provided data), then deploy the warehouse tables.
    pub fn prepare_test_data_for_normal_cubes(
        &self,
        model_name: &str,
        use_provided_data: bool,
    ) -> DeployResult<DeployReport> {
        if use_provided_data {
            info!(model = %model_name, "building normal cubes with provided dataset");
        } else {
            info!(model = %model_name, "building normal cubes with random dataset");
            let model = self.metadata.get_data_model_desc(model_name)?;
            self.data_generator()
                .generate_and_store(&model, self.config.fixture.generated_rows)?;
        }
        self.deployer().deploy()
    }

    /// Generate `count` streaming records for the cube's root fact table,
    /// load them into `loader`, and append the same rows as CSV to the
    /// fact table's data.
    pub fn prepare_test_data_for_streaming_cube(
        &self,
        start: u64,
        end: u64,
        count: usize,
        cube_name: &str,
        loader: &mut dyn StreamDataLoader,
    ) -> DeployResult<AppendOutcome> {
        let cube = self.metadata.get_cube(cube_name)?;
        let fact = self.metadata.get_root_fact_table(&cube)?;

        let mut generator = StreamingTableDataGenerator::new(
            self.config.fixture.seed,
            self.config.fixture.stream_timestamp_field.clone(),
        );
        let records = generator.generate(count, start, end, &fact)?;

        loader.load(&records)?;
        info!(count = records.len(), %loader, "wrote messages into stream");

        let parser = TimedJsonStreamParser::for_table(&fact);
        let mut csv = String::new();
        for record in &records {
            csv.push_str(&parser.parse(record.as_bytes())?.join(","));
            csv.push('\n');
        }
        self.appender().append(&csv, &fact.identity())
    }
}
