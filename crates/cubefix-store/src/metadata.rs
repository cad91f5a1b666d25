//! Descriptor lookup on top of the resource store.

use tracing::{debug, info};

use cubefix_core::path::{CUBE_ROOT, ResourcePath};
use cubefix_core::{CubeDesc, CubeInstance, DataModelDesc, TableDesc};

use crate::error::{StoreError, StoreResult};
use crate::store::{ResourceStore, now_millis};

/// Typed access to table, model, and cube descriptors.
#[derive(Clone)]
pub struct MetadataManager {
    store: ResourceStore,
}

impl MetadataManager {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    fn require<T: serde::de::DeserializeOwned>(&self, path: ResourcePath) -> StoreResult<T> {
        self.store
            .get_json(path.as_str())?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    // ── Tables ─────────────────────────────────────────────────────

    /// Look up a table by `DB.NAME` (any case).
    pub fn get_table_desc(&self, table: &str) -> StoreResult<TableDesc> {
        self.require(ResourcePath::table_desc(table)?)
    }

    pub fn put_table_desc(&self, desc: &TableDesc) -> StoreResult<()> {
        let path = ResourcePath::table_desc(&desc.identity())?;
        self.store.put_json(path.as_str(), desc, now_millis())
    }

    // ── Models ─────────────────────────────────────────────────────

    pub fn get_data_model_desc(&self, name: &str) -> StoreResult<DataModelDesc> {
        self.require(ResourcePath::model_desc(name)?)
    }

    pub fn put_data_model_desc(&self, desc: &DataModelDesc) -> StoreResult<()> {
        let path = ResourcePath::model_desc(&desc.name)?;
        self.store.put_json(path.as_str(), desc, now_millis())
    }

    // ── Cubes ──────────────────────────────────────────────────────

    pub fn get_cube(&self, name: &str) -> StoreResult<CubeInstance> {
        self.require(ResourcePath::cube(name)?)
    }

    pub fn put_cube(&self, cube: &CubeInstance) -> StoreResult<()> {
        let path = ResourcePath::cube(&cube.name)?;
        self.store.put_json(path.as_str(), cube, now_millis())
    }

    /// Every cube instance in the store, in path order.
    pub fn list_all_cubes(&self) -> StoreResult<Vec<CubeInstance>> {
        let prefix = format!("{CUBE_ROOT}/");
        let mut cubes = Vec::new();
        for path in self.store.list_resources(&prefix)? {
            if let Some(cube) = self.store.get_json::<CubeInstance>(&path)? {
                cubes.push(cube);
            }
        }
        Ok(cubes)
    }

    pub fn get_cube_desc(&self, name: &str) -> StoreResult<CubeDesc> {
        self.require(ResourcePath::cube_desc(name)?)
    }

    /// Descriptor of a cube instance.
    pub fn get_cube_desc_for(&self, cube: &CubeInstance) -> StoreResult<CubeDesc> {
        self.get_cube_desc(&cube.desc_name)
    }

    /// Recompute the descriptor's signature and store it.
    pub fn update_cube_desc(&self, desc: &CubeDesc) -> StoreResult<CubeDesc> {
        let mut updated = desc.clone();
        updated.signature = Some(desc.calculate_signature());
        let path = ResourcePath::cube_desc(&updated.name)?;
        self.store.put_json(path.as_str(), &updated, now_millis())?;
        debug!(cube_desc = %updated.name, "cube desc signature updated");
        Ok(updated)
    }

    /// Data model behind a cube.
    pub fn get_model_for_cube(&self, cube: &CubeInstance) -> StoreResult<DataModelDesc> {
        let desc = self.get_cube_desc_for(cube)?;
        self.get_data_model_desc(&desc.model_name)
    }

    /// Root fact table descriptor of a cube.
    pub fn get_root_fact_table(&self, cube: &CubeInstance) -> StoreResult<TableDesc> {
        let model = self.get_model_for_cube(cube)?;
        info!(cube = %cube.name, fact_table = %model.fact_table, "resolved root fact table");
        self.get_table_desc(&model.fact_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefix_core::{ColumnDesc, CubeStatus};

    fn manager() -> MetadataManager {
        MetadataManager::new(ResourceStore::open_in_memory().unwrap())
    }

    fn fact_table() -> TableDesc {
        TableDesc {
            name: "TEST_KYLIN_FACT".to_string(),
            database: "DEFAULT".to_string(),
            columns: vec![ColumnDesc {
                id: "1".to_string(),
                name: "PRICE".to_string(),
                datatype: "decimal(19,4)".to_string(),
            }],
        }
    }

    fn seed_cube(mgr: &MetadataManager) -> CubeInstance {
        mgr.put_table_desc(&fact_table()).unwrap();
        mgr.put_data_model_desc(&DataModelDesc {
            name: "test_model".to_string(),
            fact_table: "default.test_kylin_fact".to_string(),
            lookups: vec![],
        })
        .unwrap();
        let desc = CubeDesc {
            name: "test_cube_desc".to_string(),
            model_name: "test_model".to_string(),
            dimensions: vec![],
            measures: vec![],
            signature: None,
        };
        let path = ResourcePath::cube_desc(&desc.name).unwrap();
        mgr.store().put_json(path.as_str(), &desc, 1).unwrap();
        let cube = CubeInstance {
            name: "test_cube".to_string(),
            desc_name: "test_cube_desc".to_string(),
            status: CubeStatus::Ready,
        };
        mgr.put_cube(&cube).unwrap();
        cube
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let mgr = manager();
        mgr.put_table_desc(&fact_table()).unwrap();
        let desc = mgr.get_table_desc("default.test_kylin_fact").unwrap();
        assert_eq!(desc, fact_table());
    }

    #[test]
    fn missing_table_is_not_found() {
        let mgr = manager();
        let err = mgr.get_table_desc("default.nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn root_fact_table_of_cube() {
        let mgr = manager();
        let cube = seed_cube(&mgr);
        assert_eq!(mgr.list_all_cubes().unwrap(), vec![cube.clone()]);
        assert_eq!(mgr.get_root_fact_table(&cube).unwrap(), fact_table());
    }

    #[test]
    fn update_cube_desc_stores_signature() {
        let mgr = manager();
        let cube = seed_cube(&mgr);
        let desc = mgr.get_cube_desc_for(&cube).unwrap();
        assert!(!desc.check_signature());

        mgr.update_cube_desc(&desc).unwrap();
        assert!(mgr.get_cube_desc("test_cube_desc").unwrap().check_signature());
    }
}
