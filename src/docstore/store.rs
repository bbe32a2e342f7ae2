use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde_json::Value;
use tracing::{debug, info};

use super::error::{CollectionError, Result, WriteFailure};
use super::filter::{Filter, resolve};
use super::keys::{
    CATALOG_PARTITION, decode_collection_key, decode_doc_key, decode_index_doc_id,
    encode_collection_key, encode_collection_prefix, encode_doc_key, encode_index_def_key,
    encode_index_def_prefix, encode_index_key, encode_index_prefix, encode_seq_key,
    index_partition_name, is_valid_collection_name,
};
use super::{Collection, Connector, Database, IndexSpec, ReplaceOutcome};

/// Opens a [`FjallDatabase`] at a fixed path
#[derive(Debug, Clone)]
pub struct FjallConnector {
    path: PathBuf,
    cache_size: Option<u64>,
}

impl FjallConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_size: None,
        }
    }

    /// Block cache size in bytes
    pub fn with_cache_size(mut self, bytes: u64) -> Self {
        self.cache_size = Some(bytes);
        self
    }
}

#[async_trait]
impl Connector for FjallConnector {
    async fn connect(&self) -> Result<Arc<dyn Database>> {
        let database = FjallDatabase::open_with(&self.path, self.cache_size)?;
        Ok(Arc::new(database))
    }
}

/// Fjall keyspace holding a set of document collections
pub struct FjallDatabase {
    keyspace: Keyspace,
    catalog: PartitionHandle,
    collections: Mutex<HashMap<String, Arc<FjallCollection>>>,
}

impl FjallDatabase {
    /// Open or create a document store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, None)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, cache_size: Option<u64>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall document store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut config = Config::new(path);
        if let Some(bytes) = cache_size {
            config = config.cache_size(bytes);
        }
        let keyspace = config.open()?;
        let catalog = keyspace.open_partition(CATALOG_PARTITION, PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            catalog,
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// Typed handle to a collection, created on first use
    pub fn open_collection(&self, name: &str) -> Result<Arc<FjallCollection>> {
        if !is_valid_collection_name(name) {
            return Err(CollectionError::InvalidName(name.to_string()));
        }

        let mut collections = lock(&self.collections);
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let collection = Arc::new(FjallCollection::open(&self.keyspace, &self.catalog, name)?);
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// Names of every collection ever opened in this keyspace
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for item in self.catalog.prefix(encode_collection_prefix()) {
            let (key, _) = item?;
            if let Some(name) = decode_collection_key(&key) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl Database for FjallDatabase {
    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let collection: Arc<dyn Collection> = self.open_collection(name)?;
        Ok(collection)
    }

    async fn drop_database(&self) -> Result<()> {
        let names = self.collection_names()?;
        for name in &names {
            self.open_collection(name)?.clear()?;
        }
        self.persist()?;
        info!(collections = names.len(), "Dropped document store");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.persist()?;
        info!("Document store closed");
        Ok(())
    }
}

/// One collection: a document partition plus its index entry partition
///
/// Writes are serialized by a per-collection lock and each document is
/// committed together with its index entries in a single batch.
pub struct FjallCollection {
    name: String,
    keyspace: Keyspace,
    docs: PartitionHandle,
    entries: PartitionHandle,
    catalog: PartitionHandle,
    specs: RwLock<Vec<IndexSpec>>,
    seq: AtomicU64,
    write_lock: Mutex<()>,
}

impl FjallCollection {
    fn open(keyspace: &Keyspace, catalog: &PartitionHandle, name: &str) -> Result<Self> {
        let docs = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        let entries =
            keyspace.open_partition(&index_partition_name(name), PartitionCreateOptions::default())?;

        catalog.insert(encode_collection_key(name), b"")?;

        // Load the next document id from the catalog
        let next_id = catalog
            .get(encode_seq_key(name))?
            .and_then(|bytes| decode_doc_key(&bytes))
            .unwrap_or(0);

        let mut specs = Vec::new();
        for item in catalog.prefix(encode_index_def_prefix(name)) {
            let (_, value) = item?;
            specs.push(serde_json::from_slice::<IndexSpec>(&value)?);
        }

        debug!(collection = name, next_id, indexes = specs.len(), "Collection opened");

        Ok(Self {
            name: name.to_string(),
            keyspace: keyspace.clone(),
            docs,
            entries,
            catalog: catalog.clone(),
            specs: RwLock::new(specs),
            seq: AtomicU64::new(next_id),
            write_lock: Mutex::new(()),
        })
    }

    fn specs(&self) -> Vec<IndexSpec> {
        self.specs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn load(&self, id: u64) -> Result<Option<Value>> {
        match self.docs.get(encode_doc_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn candidate_ids(&self, index: &str, value: &Value) -> Result<BTreeSet<u64>> {
        let mut ids = BTreeSet::new();
        for item in self.entries.prefix(encode_index_prefix(index, value)) {
            let (key, _) = item?;
            if let Some(id) = decode_index_doc_id(&key) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Matching documents in id order, served from an index when the filter
    /// pins an indexed field to a scalar
    fn scan(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<(u64, Value)>> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut found = Vec::new();
        if limit == 0 {
            return Ok(found);
        }

        let lookup = filter.indexable_eq().and_then(|(path, value)| {
            self.specs()
                .into_iter()
                .find(|spec| spec.lookup_field() == Some(path))
                .map(|spec| (spec.name, value.clone()))
        });

        if let Some((index, value)) = lookup {
            for id in self.candidate_ids(&index, &value)? {
                if let Some(doc) = self.load(id)? {
                    if filter.matches(&doc) {
                        found.push((id, doc));
                        if found.len() >= limit {
                            break;
                        }
                    }
                }
            }
            return Ok(found);
        }

        for item in self.docs.iter() {
            let (key, value) = item?;
            let Some(id) = decode_doc_key(&key) else {
                continue;
            };
            let doc: Value = serde_json::from_slice(&value)?;
            if filter.matches(&doc) {
                found.push((id, doc));
                if found.len() >= limit {
                    break;
                }
            }
        }
        Ok(found)
    }

    fn check_unique(&self, specs: &[IndexSpec], doc: &Value, exclude: Option<u64>) -> Result<()> {
        for spec in specs.iter().filter(|spec| spec.unique) {
            let Some(field) = spec.lookup_field() else {
                continue;
            };
            for value in entry_values(doc, field) {
                let clash = self
                    .candidate_ids(&spec.name, &value)?
                    .into_iter()
                    .any(|id| Some(id) != exclude);
                if clash {
                    return Err(CollectionError::DuplicateKey {
                        collection: self.name.clone(),
                        index: spec.name.clone(),
                        key: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Caller holds the write lock
    fn insert_locked(&self, specs: &[IndexSpec], doc: &Value) -> Result<u64> {
        if !doc.is_object() {
            return Err(CollectionError::NotAnObject);
        }
        self.check_unique(specs, doc, None)?;

        let id = self.seq.fetch_add(1, Ordering::SeqCst);
        let mut batch = self.keyspace.batch();
        for key in entry_keys(specs, doc, id) {
            batch.insert(&self.entries, key, Vec::<u8>::new());
        }
        batch.insert(&self.docs, encode_doc_key(id), serde_json::to_vec(doc)?);
        batch.insert(
            &self.catalog,
            encode_seq_key(&self.name),
            (id + 1).to_be_bytes().to_vec(),
        );
        batch.commit()?;
        Ok(id)
    }

    /// Caller holds the write lock
    fn rewrite_locked(
        &self,
        specs: &[IndexSpec],
        id: u64,
        previous: &Value,
        doc: &Value,
    ) -> Result<()> {
        let stale = entry_keys(specs, previous, id);
        let fresh = entry_keys(specs, doc, id);

        let mut batch = self.keyspace.batch();
        for key in stale.difference(&fresh) {
            batch.remove(&self.entries, key.clone());
        }
        for key in fresh.difference(&stale) {
            batch.insert(&self.entries, key.clone(), Vec::<u8>::new());
        }
        batch.insert(&self.docs, encode_doc_key(id), serde_json::to_vec(doc)?);
        batch.commit()?;
        Ok(())
    }

    /// Remove every document, index entry and index definition
    pub fn clear(&self) -> Result<()> {
        let _guard = lock(&self.write_lock);

        let mut batch = self.keyspace.batch();
        for item in self.docs.iter() {
            let (key, _) = item?;
            batch.remove(&self.docs, key.to_vec());
        }
        for item in self.entries.iter() {
            let (key, _) = item?;
            batch.remove(&self.entries, key.to_vec());
        }
        for item in self.catalog.prefix(encode_index_def_prefix(&self.name)) {
            let (key, _) = item?;
            batch.remove(&self.catalog, key.to_vec());
        }
        batch.commit()?;

        self.specs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!(collection = %self.name, "Collection cleared");
        Ok(())
    }
}

#[async_trait]
impl Collection for FjallCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>> {
        Ok(self.scan(filter, Some(1))?.into_iter().next().map(|(_, doc)| doc))
    }

    async fn find(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>> {
        Ok(self
            .scan(filter, limit)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.scan(filter, None)?.len() as u64)
    }

    async fn insert_one(&self, doc: Value) -> Result<()> {
        let _guard = lock(&self.write_lock);
        let id = self.insert_locked(&self.specs(), &doc)?;
        debug!(collection = %self.name, id, "Inserted document");
        Ok(())
    }

    async fn insert_many(&self, docs: Vec<Value>, ordered: bool) -> Result<usize> {
        let _guard = lock(&self.write_lock);
        let specs = self.specs();

        let mut inserted = 0;
        let mut failures = Vec::new();
        for (index, doc) in docs.iter().enumerate() {
            match self.insert_locked(&specs, doc) {
                Ok(_) => inserted += 1,
                Err(err) => {
                    failures.push(WriteFailure::from_error(index, &err));
                    if ordered {
                        break;
                    }
                }
            }
        }

        debug!(
            collection = %self.name,
            inserted,
            failed = failures.len(),
            "Bulk insert finished"
        );

        if failures.is_empty() {
            Ok(inserted)
        } else {
            Err(CollectionError::BulkWrite {
                collection: self.name.clone(),
                inserted,
                failures,
            })
        }
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        doc: Value,
        upsert: bool,
    ) -> Result<ReplaceOutcome> {
        if !doc.is_object() {
            return Err(CollectionError::NotAnObject);
        }
        let _guard = lock(&self.write_lock);
        let specs = self.specs();

        match self.scan(filter, Some(1))?.into_iter().next() {
            Some((_, previous)) if previous == doc => Ok(ReplaceOutcome {
                matched: 1,
                modified: 0,
                upserted: None,
            }),
            Some((id, previous)) => {
                self.check_unique(&specs, &doc, Some(id))?;
                self.rewrite_locked(&specs, id, &previous, &doc)?;
                Ok(ReplaceOutcome {
                    matched: 1,
                    modified: 1,
                    upserted: None,
                })
            }
            None if upsert => {
                let id = self.insert_locked(&specs, &doc)?;
                Ok(ReplaceOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: Some(id),
                })
            }
            None => Ok(ReplaceOutcome::default()),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64> {
        let _guard = lock(&self.write_lock);
        let specs = self.specs();

        let doomed = self.scan(filter, None)?;
        if doomed.is_empty() {
            return Ok(0);
        }

        let mut batch = self.keyspace.batch();
        for (id, doc) in &doomed {
            for key in entry_keys(&specs, doc, *id) {
                batch.remove(&self.entries, key);
            }
            batch.remove(&self.docs, encode_doc_key(*id));
        }
        batch.commit()?;

        debug!(collection = %self.name, deleted = doomed.len(), "Deleted documents");
        Ok(doomed.len() as u64)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.clear()
    }

    async fn create_index(&self, spec: IndexSpec) -> Result<()> {
        let _guard = lock(&self.write_lock);

        if let Some(current) = self.specs().iter().find(|s| s.name == spec.name) {
            if *current == spec {
                debug!(collection = %self.name, index = %spec.name, "Index already exists");
                return Ok(());
            }
            return Err(CollectionError::IndexConflict {
                collection: self.name.clone(),
                index: spec.name,
            });
        }

        let mut batch = self.keyspace.batch();
        if let Some(field) = spec.lookup_field() {
            // Backfill entries for documents already stored
            let mut seen: HashMap<String, u64> = HashMap::new();
            for item in self.docs.iter() {
                let (key, value) = item?;
                let Some(id) = decode_doc_key(&key) else {
                    continue;
                };
                let doc: Value = serde_json::from_slice(&value)?;
                for value in entry_values(&doc, field) {
                    if spec.unique {
                        if let Some(other) = seen.insert(value.to_string(), id) {
                            if other != id {
                                return Err(CollectionError::DuplicateKey {
                                    collection: self.name.clone(),
                                    index: spec.name.clone(),
                                    key: value.to_string(),
                                });
                            }
                        }
                    }
                    batch.insert(&self.entries, encode_index_key(&spec.name, &value, id), Vec::<u8>::new());
                }
            }
        }
        batch.insert(
            &self.catalog,
            encode_index_def_key(&self.name, &spec.name),
            serde_json::to_vec(&spec)?,
        );
        batch.commit()?;

        info!(collection = %self.name, index = %spec.name, unique = spec.unique, "Index created");
        self.specs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec);
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSpec>> {
        Ok(self.specs())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Non-null values stored at `field`, one per array element
fn entry_values(doc: &Value, field: &str) -> Vec<Value> {
    let mut values = Vec::new();
    for candidate in resolve(doc, field) {
        match candidate {
            Value::Null => {}
            Value::Array(items) => values.extend(items.iter().filter(|v| !v.is_null()).cloned()),
            other => values.push(other.clone()),
        }
    }
    values
}

fn entry_keys(specs: &[IndexSpec], doc: &Value, id: u64) -> BTreeSet<Vec<u8>> {
    let mut keys = BTreeSet::new();
    for spec in specs {
        if let Some(field) = spec.lookup_field() {
            for value in entry_values(doc, field) {
                keys.insert(encode_index_key(&spec.name, &value, id));
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_db() -> (FjallDatabase, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = FjallDatabase::open(temp_dir.path().join("docs")).unwrap();
        (db, temp_dir)
    }

    fn txn(txid: &str, block: Option<u64>) -> Value {
        match block {
            Some(i) => json!({ "tx": { "h": txid }, "blk": { "i": i } }),
            None => json!({ "tx": { "h": txid } }),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();

        coll.insert_one(txn("a", Some(1))).await.unwrap();
        coll.insert_one(txn("b", Some(2))).await.unwrap();

        let found = coll.find_one(&Filter::eq("tx.h", "b")).await.unwrap();
        assert_eq!(found, Some(txn("b", Some(2))));
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 2);
        assert_eq!(coll.find(&Filter::All, Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_collection_name() {
        let (db, _temp) = create_test_db();
        assert!(matches!(
            db.collection("bad.name"),
            Err(CollectionError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_outcomes() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("tokens").unwrap();
        let filter = Filter::eq("tx.h", "a");

        let inserted = coll.replace_one(&filter, txn("a", None), true).await.unwrap();
        assert_eq!(inserted.matched, 0);
        assert!(inserted.upserted.is_some());

        let unchanged = coll.replace_one(&filter, txn("a", None), true).await.unwrap();
        assert_eq!((unchanged.matched, unchanged.modified), (1, 0));

        let modified = coll.replace_one(&filter, txn("a", Some(5)), true).await.unwrap();
        assert_eq!((modified.matched, modified.modified), (1, 1));

        let missing = coll
            .replace_one(&Filter::eq("tx.h", "zz"), txn("zz", None), false)
            .await
            .unwrap();
        assert_eq!(missing, ReplaceOutcome::default());
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();
        coll.create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap();

        coll.insert_one(txn("a", None)).await.unwrap();
        let err = coll.insert_one(txn("a", Some(3))).await.unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_unordered_insert_many_reports_failures() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();
        coll.create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap();
        coll.insert_one(txn("b", None)).await.unwrap();

        let docs = vec![txn("a", None), txn("b", None), txn("c", None)];
        match coll.insert_many(docs, false).await {
            Err(CollectionError::BulkWrite {
                inserted, failures, ..
            }) => {
                assert_eq!(inserted, 2);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert!(failures[0].is_duplicate_key());
            }
            other => panic!("expected bulk write error, got {other:?}"),
        }
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ordered_insert_many_stops_at_failure() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();
        coll.create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap();

        let docs = vec![txn("a", None), txn("a", None), txn("c", None)];
        let err = coll.insert_many(docs, true).await.unwrap_err();
        assert!(matches!(err, CollectionError::BulkWrite { inserted: 1, .. }));
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_lookup_tracks_replacements_and_deletes() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();
        coll.create_index(IndexSpec::ascending("blk.i")).await.unwrap();

        coll.insert_one(txn("a", Some(100))).await.unwrap();
        coll.insert_one(txn("b", Some(100))).await.unwrap();
        coll.replace_one(&Filter::eq("tx.h", "b"), txn("b", Some(101)), false)
            .await
            .unwrap();

        assert_eq!(coll.count(&Filter::eq("blk.i", 100)).await.unwrap(), 1);
        assert_eq!(coll.count(&Filter::eq("blk.i", 101)).await.unwrap(), 1);

        assert_eq!(coll.delete_many(&Filter::eq("blk.i", 100)).await.unwrap(), 1);
        assert_eq!(coll.count(&Filter::eq("blk.i", 100)).await.unwrap(), 0);
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_index_backfills_and_detects_conflicts() {
        let (db, _temp) = create_test_db();
        let coll = db.collection("confirmed").unwrap();
        coll.insert_one(txn("a", None)).await.unwrap();
        coll.insert_one(txn("a", None)).await.unwrap();

        let err = coll
            .create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());

        coll.create_index(IndexSpec::ascending("tx.h")).await.unwrap();
        coll.create_index(IndexSpec::ascending("tx.h")).await.unwrap();
        assert_eq!(coll.count(&Filter::eq("tx.h", "a")).await.unwrap(), 2);

        let conflict = coll
            .create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap_err();
        assert!(matches!(conflict, CollectionError::IndexConflict { .. }));
    }

    #[tokio::test]
    async fn test_indexes_and_sequence_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs");
        {
            let db = FjallDatabase::open(&path).unwrap();
            let coll = db.collection("confirmed").unwrap();
            coll.create_index(IndexSpec::ascending("tx.h").unique())
                .await
                .unwrap();
            coll.insert_one(txn("a", None)).await.unwrap();
            db.close().await.unwrap();
        }

        let db = FjallDatabase::open(&path).unwrap();
        let coll = db.collection("confirmed").unwrap();
        assert_eq!(coll.list_indexes().await.unwrap().len(), 1);
        assert!(coll.insert_one(txn("a", None)).await.unwrap_err().is_duplicate_key());
        coll.insert_one(txn("b", None)).await.unwrap();
        assert_eq!(coll.count(&Filter::All).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drop_database_clears_everything() {
        let (db, _temp) = create_test_db();
        let confirmed = db.collection("confirmed").unwrap();
        let tokens = db.collection("tokens").unwrap();
        confirmed
            .create_index(IndexSpec::ascending("tx.h").unique())
            .await
            .unwrap();
        confirmed.insert_one(txn("a", None)).await.unwrap();
        tokens.insert_one(json!({ "name": "t" })).await.unwrap();

        db.drop_database().await.unwrap();

        assert_eq!(confirmed.count(&Filter::All).await.unwrap(), 0);
        assert_eq!(tokens.count(&Filter::All).await.unwrap(), 0);
        assert!(confirmed.list_indexes().await.unwrap().is_empty());
    }
}
