//! The datastore handle: upsert-merge writes and queries over one store file.

use crate::config::{Config, CorruptLinePolicy};
use crate::error::{CoreError, CoreResult};
use crate::import;
use crate::query::{sort::sort_records, Query};
use crate::record::{decode_line, encode_line, Record, RecordId, StoredRecord};
use crate::schema::Schema;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tracing::{debug, info, warn};
use viewstore_storage::{AtomicWriter, Line, LineReader, StorageError, StoreFile};

/// Outcome of an [`Datastore::insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    /// Stored records replaced by a record from the batch.
    pub updated: usize,
    /// Batch records appended as new.
    pub inserted: usize,
    /// Stored records carried over untouched.
    pub unchanged: usize,
}

impl InsertStats {
    /// Number of records in the store after the insert.
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated + self.inserted + self.unchanged
    }
}

/// A flat-file record store.
///
/// `Datastore` ties a store path to the [`Schema`] its records follow and
/// the [`Config`] used to read and write it. The handle is cheap to clone
/// and holds no open files; every operation opens what it needs.
///
/// Writes are upsert-merges: the current store is streamed once into a
/// temporary sibling, records whose composite ID appears in the batch are
/// replaced, the rest pass through byte for byte, and new records are
/// appended. The finished file is renamed over the store.
///
/// ```rust,no_run
/// # async fn demo() -> viewstore_core::CoreResult<()> {
/// use viewstore_core::{Datastore, OrderSpec, Query, Schema};
///
/// let store = Datastore::new("data/datastore.psv", Schema::media_views());
/// store.import_file("views.psv".as_ref()).await?;
///
/// let rows = store
///     .query(&Query::new().select(["TITLE", "REV"]).order_by(OrderSpec::desc("REV")))
///     .await?;
/// for row in rows {
///     println!("{row}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Datastore {
    store: StoreFile,
    schema: Arc<Schema>,
    config: Config,
}

impl Datastore {
    /// Creates a handle with the default configuration.
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self::with_config(path, schema, Config::default())
    }

    /// Creates a handle with a custom configuration.
    pub fn with_config(path: impl Into<PathBuf>, schema: Schema, config: Config) -> Self {
        let store = StoreFile::new(path)
            .with_chunk_size(config.chunk_size)
            .with_sync_on_write(config.sync_on_write);
        Self {
            store,
            schema: Arc::new(schema),
            config,
        }
    }

    /// Returns the store path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads an import file using this store's delimiter and chunk size.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the file is missing and
    /// `CoreError::MalformedImport` for rows that do not match the header.
    pub async fn read_import_file(&self, path: &Path) -> CoreResult<Vec<Record>> {
        import::read_import_file(path, self.config.delimiter, self.config.chunk_size).await
    }

    /// Reads an import file and inserts its records.
    ///
    /// # Errors
    ///
    /// See [`Datastore::read_import_file`] and [`Datastore::insert`].
    pub async fn import_file(&self, path: &Path) -> CoreResult<InsertStats> {
        let records = self.read_import_file(path).await?;
        let stats = self.insert(records).await?;
        info!(
            source = %path.display(),
            updated = stats.updated,
            inserted = stats.inserted,
            unchanged = stats.unchanged,
            "imported file"
        );
        Ok(stats)
    }

    /// Upserts a batch of raw records.
    ///
    /// The whole batch is validated before anything is written. Within the
    /// batch a later record with the same composite ID replaces an earlier
    /// one. An empty batch leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation`, `CoreError::UnknownField` or
    /// `CoreError::MissingKeyField` for a rejected batch, in which case the
    /// store is not modified. I/O and corrupt store lines also abort the
    /// write and leave the previous store in place.
    pub async fn insert(&self, records: Vec<Record>) -> CoreResult<InsertStats> {
        if records.is_empty() {
            debug!(path = %self.path().display(), "empty batch, nothing to write");
            return Ok(InsertStats::default());
        }

        let mut pending = PendingBatch::build(&self.schema, records)?;
        debug!(
            path = %self.path().display(),
            records = pending.len(),
            "validated batch"
        );

        let mut writer = self.store.begin_write().await?;
        match self.write_merged(&mut writer, &mut pending).await {
            Ok(stats) => {
                writer.commit().await?;
                Ok(stats)
            }
            Err(err) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(error = %abort_err, "failed to remove temporary store file");
                }
                Err(err)
            }
        }
    }

    async fn write_merged(
        &self,
        writer: &mut AtomicWriter,
        pending: &mut PendingBatch,
    ) -> CoreResult<InsertStats> {
        let mut stats = InsertStats::default();

        match self.store.open_lines().await {
            Ok(mut lines) => {
                while let Some((line, existing)) = self.next_stored(&mut lines).await? {
                    match pending.take(&existing.id) {
                        Some(replacement) => {
                            writer.write_line(&encode_line(&replacement)?).await?;
                            stats.updated += 1;
                        }
                        None => {
                            writer.write_line(&line.text).await?;
                            stats.unchanged += 1;
                        }
                    }
                }
            }
            Err(err) if err.is_not_found() => {
                debug!(path = %self.path().display(), "no store yet, creating it");
            }
            Err(err) => return Err(err.into()),
        }

        for record in pending.drain() {
            writer.write_line(&encode_line(&record)?).await?;
            stats.inserted += 1;
        }

        Ok(stats)
    }

    /// Runs a query and returns the projected rows.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::OrderLimit` or `CoreError::UnknownField` for
    /// an invalid query, before the store is opened, and
    /// `CoreError::NotFound` if there is no store file.
    pub async fn query(&self, query: &Query) -> CoreResult<Vec<String>> {
        let records = self.query_records(query).await?;
        Ok(records
            .iter()
            .map(|record| query.project(record, &self.schema, &self.config.result_separator))
            .collect())
    }

    /// Runs a query and returns the filtered, sorted records unprojected.
    ///
    /// # Errors
    ///
    /// See [`Datastore::query`].
    pub async fn query_records(&self, query: &Query) -> CoreResult<Vec<StoredRecord>> {
        query.check(&self.schema)?;

        let mut lines = self.store.open_lines().await?;
        let mut matched = Vec::new();
        let mut scanned = 0usize;
        while let Some((_, record)) = self.next_stored(&mut lines).await? {
            scanned += 1;
            if query.matches(&record) {
                matched.push(record);
            }
        }
        debug!(scanned, matched = matched.len(), "filtered store");

        sort_records(matched, &query.order, &self.schema)
    }

    /// Deletes the store file.
    ///
    /// Returns `false` if there was no store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn drop_all(&self) -> CoreResult<bool> {
        let removed = self.store.remove().await?;
        if removed {
            info!(path = %self.path().display(), "dropped store");
        } else {
            debug!(path = %self.path().display(), "no store to drop");
        }
        Ok(removed)
    }

    /// Reads up to the next decodable store line.
    ///
    /// Blank lines are passed over. Lines that are not UTF-8 or not a valid
    /// record are handled by the corrupt-line policy.
    async fn next_stored(
        &self,
        lines: &mut LineReader<File>,
    ) -> CoreResult<Option<(Line, StoredRecord)>> {
        loop {
            let decoded = match lines.next_line().await {
                Ok(None) => return Ok(None),
                Ok(Some(line)) if line.text.is_empty() => continue,
                Ok(Some(line)) => {
                    decode_line(line.number, &line.text).map(|record| (line, record))
                }
                Err(StorageError::InvalidUtf8 { line }) => {
                    Err(CoreError::corrupt_record(line, "not valid UTF-8"))
                }
                Err(err) => return Err(err.into()),
            };

            match decoded {
                Ok(pair) => return Ok(Some(pair)),
                Err(err) if self.config.corrupt_lines == CorruptLinePolicy::Skip => {
                    warn!(
                        path = %self.path().display(),
                        error = %err,
                        "skipping corrupt store line"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Validated batch records keyed by composite ID, in first-seen order.
#[derive(Debug)]
struct PendingBatch {
    slots: Vec<Option<StoredRecord>>,
    index: HashMap<RecordId, usize>,
}

impl PendingBatch {
    fn build(schema: &Schema, records: Vec<Record>) -> CoreResult<Self> {
        let mut batch = Self {
            slots: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
        };

        for record in records {
            schema.validate_record(&record)?;
            let id = schema.record_id(&record)?;
            let stored = StoredRecord::new(id.clone(), record);
            match batch.index.get(&id) {
                Some(&slot) => batch.slots[slot] = Some(stored),
                None => {
                    batch.index.insert(id, batch.slots.len());
                    batch.slots.push(Some(stored));
                }
            }
        }

        Ok(batch)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn take(&mut self, id: &RecordId) -> Option<StoredRecord> {
        let slot = self.index.remove(id)?;
        self.slots[slot].take()
    }

    fn drain(&mut self) -> impl Iterator<Item = StoredRecord> {
        self.index.clear();
        std::mem::take(&mut self.slots).into_iter().flatten()
    }
}
