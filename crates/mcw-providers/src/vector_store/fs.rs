//! Filesystem-backed vector store.
//!
//! Tables live in memory as sorted maps and are snapshotted to
//! `<root>/<namespace>/<table>/records.json` after every committed batch.
//! Snapshot writes go to a temp file first and are renamed into place, so a
//! crash mid-write never corrupts a table. The per-table `RwLock` is the
//! serialization point the failure model requires: a batch either commits
//! (memory and disk) or leaves both untouched.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mcw_domain::constants::{HYBRID_CANDIDATE_MULTIPLIER, RRF_K};
use mcw_domain::error::{Error, Result};
use mcw_domain::ops::{BackupDescriptor, BackupManifest, RestoreReport};
use mcw_domain::ports::backup::NamespaceArchiver;
use mcw_domain::ports::{
    OrderBy, RecordFilter, ScoredRecord, StoredRecord, TableKind, TableRef, VectorStore, WriteOp,
};
use mcw_domain::value_objects::{Embedding, Namespace};

const RECORDS_FILE: &str = "records.json";
const BACKUP_DIR: &str = "backups";
const MANIFEST_FILE: &str = "manifest.json";
const SCHEMA_VERSION: u32 = 1;

type TableKey = (String, TableKind);
type Records = BTreeMap<String, StoredRecord>;
type TableHandle = Arc<RwLock<Records>>;

/// Persistent per-namespace entity store.
pub struct FsVectorStore {
    root: PathBuf,
    tables: RwLock<HashMap<TableKey, TableHandle>>,
}

impl FsVectorStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            tables: RwLock::new(HashMap::new()),
        })
    }

    fn table_dir(&self, table: &TableRef) -> PathBuf {
        self.root
            .join(table.namespace.as_str())
            .join(table.kind.dir_name())
    }

    fn namespace_dir(&self, namespace: &Namespace) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    fn load_records(path: &Path) -> Result<Records> {
        let file = path.join(RECORDS_FILE);
        if !file.exists() {
            return Ok(Records::new());
        }
        let content = std::fs::read_to_string(&file)?;
        let records: Vec<StoredRecord> = serde_json::from_str(&content)?;
        Ok(records.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    fn persist_records(dir: &Path, records: &Records) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let values: Vec<&StoredRecord> = records.values().collect();
        let content = serde_json::to_string(&values)?;
        let tmp = dir.join(format!("{RECORDS_FILE}.tmp"));
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, dir.join(RECORDS_FILE))?;
        Ok(())
    }

    async fn table(&self, table: &TableRef) -> Result<TableHandle> {
        let key: TableKey = (table.namespace.as_str().to_owned(), table.kind);
        {
            let tables = self.tables.read().await;
            if let Some(handle) = tables.get(&key) {
                return Ok(Arc::clone(handle));
            }
        }
        let mut tables = self.tables.write().await;
        // Re-check: another task may have loaded it while we waited.
        if let Some(handle) = tables.get(&key) {
            return Ok(Arc::clone(handle));
        }
        let records = Self::load_records(&self.table_dir(table))?;
        let handle = Arc::new(RwLock::new(records));
        tables.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop cached tables for a namespace (used after restore).
    async fn evict_namespace(&self, namespace: &Namespace) {
        let mut tables = self.tables.write().await;
        tables.retain(|(ns, _), _| ns != namespace.as_str());
    }

    fn matches(filter: Option<RecordFilter<'_>>, record: &StoredRecord) -> bool {
        filter.is_none_or(|f| f(&record.fields))
    }

    fn compare_fields(a: &serde_json::Value, b: &serde_json::Value) -> std::cmp::Ordering {
        use serde_json::Value as V;
        use std::cmp::Ordering;
        match (a, b) {
            (V::Number(x), V::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (V::String(x), V::String(y)) => x.cmp(y),
            (V::Bool(x), V::Bool(y)) => x.cmp(y),
            (V::Null, V::Null) => Ordering::Equal,
            (V::Null, _) => Ordering::Less,
            (_, V::Null) => Ordering::Greater,
            _ => a.to_string().cmp(&b.to_string()),
        }
    }

    fn sorted_hits(mut hits: Vec<ScoredRecord>, k: usize) -> Vec<ScoredRecord> {
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        hits.truncate(k);
        hits
    }

    fn table_counts(&self, namespace: &Namespace) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for kind in TableKind::ALL {
            let dir = self.namespace_dir(namespace).join(kind.dir_name());
            let records = Self::load_records(&dir)?;
            counts.insert(kind.dir_name().to_owned(), records.len());
        }
        Ok(counts)
    }
}

#[async_trait]
impl VectorStore for FsVectorStore {
    async fn upsert(&self, table: &TableRef, record: StoredRecord) -> Result<()> {
        self.apply(table, vec![WriteOp::Put(record)]).await
    }

    async fn get(&self, table: &TableRef, id: &str) -> Result<Option<StoredRecord>> {
        let handle = self.table(table).await?;
        let records = handle.read().await;
        Ok(records.get(id).cloned())
    }

    async fn delete(&self, table: &TableRef, id: &str) -> Result<bool> {
        let handle = self.table(table).await?;
        let existed = handle.read().await.contains_key(id);
        if existed {
            self.apply(table, vec![WriteOp::Delete(id.to_owned())])
                .await?;
        }
        Ok(existed)
    }

    async fn apply(&self, table: &TableRef, ops: Vec<WriteOp>) -> Result<()> {
        let handle = self.table(table).await?;
        let mut records = handle.write().await;
        // Stage the batch on a copy; commit memory only after the snapshot
        // reaches disk, so a failed write leaves the table untouched.
        let mut staged = records.clone();
        for op in ops {
            match op {
                WriteOp::Put(record) => {
                    staged.insert(record.id.clone(), record);
                }
                WriteOp::Delete(id) => {
                    staged.remove(&id);
                }
            }
        }
        Self::persist_records(&self.table_dir(table), &staged)
            .map_err(|e| Error::store(format!("failed to persist {table}: {e}")))?;
        *records = staged;
        Ok(())
    }

    async fn scan(
        &self,
        table: &TableRef,
        filter: Option<RecordFilter<'_>>,
        order_by: Option<OrderBy>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>> {
        let handle = self.table(table).await?;
        let records = handle.read().await;
        let mut hits: Vec<StoredRecord> = records
            .values()
            .filter(|r| Self::matches(filter, r))
            .cloned()
            .collect();
        if let Some(order) = order_by {
            hits.sort_by(|a, b| {
                let av = a.fields.get(&order.field).unwrap_or(&serde_json::Value::Null);
                let bv = b.fields.get(&order.field).unwrap_or(&serde_json::Value::Null);
                let cmp = Self::compare_fields(av, bv).then_with(|| a.id.cmp(&b.id));
                if order.descending { cmp.reverse() } else { cmp }
            });
        }
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, table: &TableRef, filter: Option<RecordFilter<'_>>) -> Result<usize> {
        let handle = self.table(table).await?;
        let records = handle.read().await;
        Ok(records.values().filter(|r| Self::matches(filter, r)).count())
    }

    async fn vector_topk(
        &self,
        table: &TableRef,
        query: &[f32],
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>> {
        let handle = self.table(table).await?;
        let records = handle.read().await;
        let hits: Vec<ScoredRecord> = records
            .values()
            .filter(|r| Self::matches(filter, r))
            .filter_map(|r| {
                let vector = r.vector.as_ref()?;
                Some(ScoredRecord {
                    record: r.clone(),
                    score: Embedding::cosine_similarity(query, vector),
                })
            })
            .collect();
        Ok(Self::sorted_hits(hits, k))
    }

    async fn keyword_topk(
        &self,
        table: &TableRef,
        query: &str,
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>> {
        let query_terms = mcw_domain::utils::tokenize(query);
        let handle = self.table(table).await?;
        let records = handle.read().await;
        let candidates: Vec<&StoredRecord> = records
            .values()
            .filter(|r| Self::matches(filter, r))
            .collect();
        let documents: Vec<Vec<String>> = candidates
            .iter()
            .map(|r| mcw_domain::utils::tokenize(&r.search_text))
            .collect();
        let scores = super::bm25::score_documents(&query_terms, &documents);
        let hits: Vec<ScoredRecord> = candidates
            .into_iter()
            .zip(scores)
            .filter(|(_, score)| *score > 0.0)
            .map(|(record, score)| ScoredRecord {
                record: record.clone(),
                score,
            })
            .collect();
        Ok(Self::sorted_hits(hits, k))
    }

    async fn hybrid_topk(
        &self,
        table: &TableRef,
        query_vector: Option<&[f32]>,
        query_text: &str,
        k: usize,
        filter: Option<RecordFilter<'_>>,
    ) -> Result<Vec<ScoredRecord>> {
        let depth = k.saturating_mul(HYBRID_CANDIDATE_MULTIPLIER).max(k);
        let keyword = if query_text.trim().is_empty() {
            Vec::new()
        } else {
            self.keyword_topk(table, query_text, depth, filter).await?
        };
        let vector = match query_vector {
            Some(q) => self.vector_topk(table, q, depth, filter).await?,
            None => Vec::new(),
        };

        // Reciprocal-rank fusion; a record missing from one ranking simply
        // contributes nothing from that side.
        let mut fused: HashMap<String, (StoredRecord, f32)> = HashMap::new();
        for (rank, hit) in keyword.into_iter().enumerate() {
            let score = 1.0 / (RRF_K + rank as f32 + 1.0);
            fused
                .entry(hit.record.id.clone())
                .and_modify(|(_, s)| *s += score)
                .or_insert((hit.record, score));
        }
        for (rank, hit) in vector.into_iter().enumerate() {
            if hit.score <= 0.0 {
                continue;
            }
            let score = 1.0 / (RRF_K + rank as f32 + 1.0);
            fused
                .entry(hit.record.id.clone())
                .and_modify(|(_, s)| *s += score)
                .or_insert((hit.record, score));
        }
        let hits = fused
            .into_values()
            .map(|(record, score)| ScoredRecord { record, score })
            .collect();
        Ok(Self::sorted_hits(hits, k))
    }

    async fn drop_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.evict_namespace(namespace).await;
        let dir = self.namespace_dir(namespace);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[async_trait]
impl NamespaceArchiver for FsVectorStore {
    async fn backup_namespace(&self, namespace: &Namespace) -> Result<BackupDescriptor> {
        // Force every table through the cache so lazily-loaded state is
        // counted, then archive the on-disk snapshots.
        for kind in TableKind::ALL {
            let _ = self
                .table(&TableRef::new(namespace.clone(), kind))
                .await?;
        }
        let counts = self.table_counts(namespace)?;
        let manifest = BackupManifest {
            schema_version: SCHEMA_VERSION,
            namespace: namespace.clone(),
            counts,
            created_at: chrono::Utc::now(),
        };
        let backup_dir = self.root.join(BACKUP_DIR);
        std::fs::create_dir_all(&backup_dir)?;
        let archive_name = format!(
            "{}-{}.tar.gz",
            namespace.as_str(),
            manifest.created_at.format("%Y%m%dT%H%M%S%3fZ")
        );
        let archive_path = backup_dir.join(&archive_name);
        let ns_dir = self.namespace_dir(namespace);
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        let result = tokio::task::spawn_blocking(move || -> Result<()> {
            let file = std::fs::File::create(&archive_path)?;
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);

            let mut header = tar::Header::new_gnu();
            header.set_size(manifest_json.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, MANIFEST_FILE, manifest_json.as_slice())?;

            for kind in TableKind::ALL {
                let records = ns_dir.join(kind.dir_name()).join(RECORDS_FILE);
                if records.exists() {
                    builder.append_path_with_name(
                        &records,
                        format!("{}/{}", kind.dir_name(), RECORDS_FILE),
                    )?;
                }
            }
            builder.into_inner()?.finish()?;
            Ok(())
        })
        .await
        .map_err(|e| Error::internal(format!("backup task failed: {e}")))?;
        result?;

        Ok(BackupDescriptor {
            archive: archive_name,
            manifest,
        })
    }

    async fn restore_namespace(
        &self,
        namespace: &Namespace,
        archive: &str,
    ) -> Result<RestoreReport> {
        let archive_path = self.root.join(BACKUP_DIR).join(archive);
        if !archive_path.exists() {
            return Err(Error::not_found(format!("backup archive '{archive}'")));
        }
        let ns_dir = self.namespace_dir(namespace);

        let counts = tokio::task::spawn_blocking(move || -> Result<BTreeMap<String, usize>> {
            if ns_dir.exists() {
                std::fs::remove_dir_all(&ns_dir)?;
            }
            let file = std::fs::File::open(&archive_path)?;
            let decoder = flate2::read::GzDecoder::new(file);
            let mut tar = tar::Archive::new(decoder);
            let mut counts = BTreeMap::new();
            for entry in tar.entries()? {
                let mut entry = entry?;
                let path = entry.path()?.into_owned();
                if path == Path::new(MANIFEST_FILE) {
                    continue;
                }
                let target = ns_dir.join(&path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                entry.unpack(&target)?;
                if let Some(table) = path.parent().and_then(|p| p.to_str()) {
                    let records = Self::load_records(&ns_dir.join(table))?;
                    counts.insert(table.to_owned(), records.len());
                }
            }
            Ok(counts)
        })
        .await
        .map_err(|e| Error::internal(format!("restore task failed: {e}")))??;

        self.evict_namespace(namespace).await;
        Ok(RestoreReport {
            namespace: namespace.clone(),
            counts,
        })
    }

    async fn list_backups(&self) -> Result<Vec<BackupDescriptor>> {
        let backup_dir = self.root.join(BACKUP_DIR);
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }
        let mut descriptors = tokio::task::spawn_blocking(move || -> Result<Vec<BackupDescriptor>> {
            let mut out = Vec::new();
            for entry in std::fs::read_dir(&backup_dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.ends_with(".tar.gz") {
                    continue;
                }
                let file = std::fs::File::open(entry.path())?;
                let decoder = flate2::read::GzDecoder::new(file);
                let mut tar = tar::Archive::new(decoder);
                for archive_entry in tar.entries()? {
                    let mut archive_entry = archive_entry?;
                    if archive_entry.path()?.as_ref() == Path::new(MANIFEST_FILE) {
                        let mut content = String::new();
                        std::io::Read::read_to_string(&mut archive_entry, &mut content)?;
                        let manifest: BackupManifest = serde_json::from_str(&content)?;
                        out.push(BackupDescriptor {
                            archive: name.clone(),
                            manifest,
                        });
                        break;
                    }
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| Error::internal(format!("backup listing failed: {e}")))??;
        descriptors.sort_by(|a, b| b.manifest.created_at.cmp(&a.manifest.created_at));
        Ok(descriptors)
    }
}
