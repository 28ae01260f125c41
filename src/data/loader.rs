use std::sync::Arc;

use anyhow::{Context, Result};

use super::cache::{SnapshotCache, DATA_TTL};
use super::decode::DataFormat;
use super::model::Table;
use super::remote::{read_dataset, ObjectStore};

// ---------------------------------------------------------------------------
// Dataset registry
// ---------------------------------------------------------------------------

/// One published pipeline output.
#[derive(Debug, Clone, Copy)]
pub struct Dataset {
    pub name: &'static str,
    pub key: &'static str,
    pub format: DataFormat,
}

pub const SCORES: Dataset = Dataset {
    name: "scores",
    key: "modeling/company_scores.csv",
    format: DataFormat::Csv,
};

pub const HIRING: Dataset = Dataset {
    name: "hiring",
    key: "modeling/hiring_friendliness_scores.csv",
    format: DataFormat::Csv,
};

pub const FEATURES: Dataset = Dataset {
    name: "features",
    key: "modeling/features.parquet",
    format: DataFormat::Parquet,
};

pub const METADATA: Dataset = Dataset {
    name: "metadata",
    key: "modeling/feature_metadata.csv",
    format: DataFormat::Csv,
};

pub const SPINE: Dataset = Dataset {
    name: "spine",
    key: "cleaned/spine_cleaned.parquet",
    format: DataFormat::Parquet,
};

pub const DATASETS: [Dataset; 5] = [SCORES, HIRING, FEATURES, METADATA, SPINE];

// ---------------------------------------------------------------------------
// Bundle loading
// ---------------------------------------------------------------------------

/// The five datasets of one snapshot. Either all are present or the load
/// failed as a whole.
#[derive(Debug)]
pub struct DataBundle {
    pub scores: Arc<Table>,
    pub hiring: Arc<Table>,
    pub features: Arc<Table>,
    pub metadata: Arc<Table>,
    pub spine: Arc<Table>,
}

/// Fetch every dataset through the cache. The first failure aborts the load;
/// datasets fetched before it stay cached for the next attempt.
pub fn load_bundle(store: &dyn ObjectStore, cache: &mut SnapshotCache) -> Result<DataBundle> {
    Ok(DataBundle {
        scores: fetch(store, cache, &SCORES)?,
        hiring: fetch(store, cache, &HIRING)?,
        features: fetch(store, cache, &FEATURES)?,
        metadata: fetch(store, cache, &METADATA)?,
        spine: fetch(store, cache, &SPINE)?,
    })
}

fn fetch(
    store: &dyn ObjectStore,
    cache: &mut SnapshotCache,
    dataset: &Dataset,
) -> Result<Arc<Table>> {
    cache.get_or_fetch(dataset.key, DATA_TTL, || {
        let table = read_dataset(store, dataset.key, dataset.format)
            .with_context(|| format!("loading dataset '{}'", dataset.name))?;
        log::info!(
            "loaded {}: {} rows, {} columns",
            dataset.name,
            table.len(),
            table.columns.len()
        );
        Ok(table)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::remote::FetchError;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    struct FakeStore {
        objects: BTreeMap<String, Vec<u8>>,
        gets: RefCell<usize>,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                objects: BTreeMap::new(),
                gets: RefCell::new(0),
            }
        }

        fn put(&mut self, key: &str, bytes: Vec<u8>) {
            self.objects.insert(key.to_string(), bytes);
        }
    }

    impl ObjectStore for FakeStore {
        fn list(&self, prefix: &str) -> Result<Vec<String>, FetchError> {
            Ok(self
                .objects
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
            *self.gets.borrow_mut() += 1;
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| FetchError::HttpStatus {
                    status: 404,
                    url: key.to_string(),
                })
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    fn parquet_bytes(ids: &[&str], extra_column: &str, values: &[f64]) -> Vec<u8> {
        use arrow::array::{Float64Array, StringArray};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("company_id", DataType::Utf8, false),
            Field::new(extra_column, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(ids.to_vec())),
                Arc::new(Float64Array::from(values.to_vec())),
            ],
        )
        .unwrap();

        let mut out = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut out, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        out
    }

    fn populated_store() -> FakeStore {
        let mut store = FakeStore::new();
        store.put(
            SCORES.key,
            b"company_id,momentum_score\nc1,81.5\nc2,40.0\n".to_vec(),
        );
        store.put(
            HIRING.key,
            b"company_id,hiring_score,hiring_rank\nc1,75.0,1\nc2,50.0,2\n".to_vec(),
        );
        store.put(
            FEATURES.key,
            parquet_bytes(&["c1", "c2"], "signal_job_posting", &[90.0, 10.0]),
        );
        store.put(
            METADATA.key,
            b"feature_name,group\nsignal_job_posting,signals\n".to_vec(),
        );
        store.put(
            SPINE.key,
            parquet_bytes(&["c1", "c2"], "total_funding_usd", &[2_300_000.0, 45_000.0]),
        );
        store
    }

    #[test]
    fn loads_all_five_datasets() {
        let store = populated_store();
        let mut cache = SnapshotCache::new();
        let bundle = load_bundle(&store, &mut cache).unwrap();
        assert_eq!(bundle.scores.len(), 2);
        assert_eq!(bundle.hiring.len(), 2);
        assert_eq!(bundle.features.len(), 2);
        assert_eq!(bundle.metadata.len(), 1);
        assert_eq!(bundle.spine.len(), 2);
    }

    #[test]
    fn one_missing_dataset_fails_the_whole_load() {
        let mut store = populated_store();
        store.objects.remove(SPINE.key);
        let mut cache = SnapshotCache::new();
        let err = load_bundle(&store, &mut cache).unwrap_err();
        assert!(format!("{err:#}").contains("loading dataset 'spine'"));
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let store = populated_store();
        let mut cache = SnapshotCache::new();
        load_bundle(&store, &mut cache).unwrap();
        let first = *store.gets.borrow();
        load_bundle(&store, &mut cache).unwrap();
        assert_eq!(*store.gets.borrow(), first);
    }
}
