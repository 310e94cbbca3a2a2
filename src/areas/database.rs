//! Content-addressable object store
//!
//! Objects live under `.hoard/objects/<2 hex>/<62 hex>`, framed as
//! `<type> <size>\0<payload>` and zlib-compressed. Blobs are keyed by the
//! SHA-256 of their raw bytes, so storing the same content twice is a cheap
//! existence check.
//!
//! ## Concurrency
//!
//! - Writes go to a temp file in the fan-out directory and are renamed into
//!   place, so readers never observe a partial object.
//! - A per-digest lock around the existence check and the write guarantees
//!   at most one physical write per digest inside the process. The sweep
//!   takes the same lock, and dedup hits refresh the object's mtime under it,
//!   so content a caller was just told is stored outlives the grace window.
//! - Chunked uploads are serialised per session id.

use crate::artifacts::database::batch::{BatchIngest, BatchReport, IngestOutcome};
use crate::artifacts::database::object_metadata::{CleanupReport, ObjectMetadata, PutOutcome};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::StoreError;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use fake::rand;
use std::collections::{HashMap, HashSet};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const TEMP_PREFIX: &str = "tmp-obj-";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    uploads_path: Box<Path>,
    existence_cache: DashSet<ObjectId>,
    write_locks: DashMap<ObjectId, Arc<Mutex<()>>>,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

// TODO: pack small objects together once repositories grow past a few hundred thousand blobs
impl Database {
    pub fn new(path: Box<Path>, uploads_path: Box<Path>) -> Self {
        Database {
            path,
            uploads_path,
            existence_cache: DashSet::new(),
            write_locks: DashMap::new(),
            session_locks: DashMap::new(),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn uploads_path(&self) -> &Path {
        &self.uploads_path
    }

    /// Store raw content, deduplicating by digest.
    pub fn put(&self, content: Bytes, metadata: &ObjectMetadata) -> Result<PutOutcome, StoreError> {
        let size = content.len() as u64;
        if let Some(declared) = metadata.declared_size
            && declared != size
        {
            return Err(StoreError::SizeMismatch {
                declared,
                actual: size,
            });
        }

        let blob = Blob::new(content);
        let (oid, newly_stored) = self.store(&blob)?;

        debug!(
            oid = %oid,
            size,
            newly_stored,
            origin = metadata.origin_path.as_deref().unwrap_or("-"),
            "put object"
        );

        Ok(PutOutcome::new(oid, size, newly_stored))
    }

    /// Load the raw content of a blob.
    pub fn get(&self, oid: &ObjectId) -> Result<(Bytes, u64), StoreError> {
        let blob = self.load_blob(oid)?;
        let size = blob.size();
        Ok((blob.into_content(), size))
    }

    pub fn exists(&self, oid: &ObjectId) -> bool {
        if self.existence_cache.contains(oid) {
            return true;
        }

        let present = self.path.join(oid.to_path()).is_file();
        if present {
            self.existence_cache.insert(oid.clone());
        }
        present
    }

    /// Digests from `oids` that the store does not hold yet
    ///
    /// Digests reported as present get their grace window restarted, since
    /// the caller will reference them without uploading.
    pub fn missing<'a>(&self, oids: impl IntoIterator<Item = &'a ObjectId>) -> Vec<ObjectId> {
        oids.into_iter()
            .filter(|oid| !self.retain_existing(oid))
            .cloned()
            .collect()
    }

    /// Persist any object; returns its ID and whether bytes were written
    ///
    /// A dedup hit checks the stored type and refreshes the object's mtime so
    /// a concurrent sweep keeps it.
    pub fn store(&self, object: &impl Object) -> Result<(ObjectId, bool), StoreError> {
        let oid = object.object_id().map_err(|e| StoreError::Malformed {
            oid: ObjectId::default(),
            reason: e.to_string(),
        })?;
        let object_type = object.object_type();

        let written = self.with_write_lock(&oid, || -> Result<bool, StoreError> {
            if self.touch(&oid)? {
                let stored = self.stored_type(&oid)?;
                if stored != object_type {
                    return Err(self.unexpected(&oid, object_type, stored));
                }
                return Ok(false);
            }

            let content = object.serialize().map_err(|e| StoreError::Malformed {
                oid: oid.clone(),
                reason: e.to_string(),
            })?;
            self.write_object(&self.path.join(oid.to_path()), content)?;
            Ok(true)
        })?;
        self.existence_cache.insert(oid.clone());

        Ok((oid, written))
    }

    /// Run `f` holding the digest's write lock.
    fn with_write_lock<T>(&self, oid: &ObjectId, f: impl FnOnce() -> T) -> T {
        let lock = self
            .write_locks
            .entry(oid.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);

        // only the map still holds the lock when nobody else is waiting on it
        self.write_locks
            .remove_if(oid, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Restart the grace window of a stored object; `false` if it is absent.
    fn retain_existing(&self, oid: &ObjectId) -> bool {
        self.exists(oid) && self.with_write_lock(oid, || self.touch(oid)).unwrap_or(false)
    }

    /// Set a stored object's mtime to now; `false` if it is not stored.
    fn touch(&self, oid: &ObjectId) -> Result<bool, StoreError> {
        let object_path = self.path.join(oid.to_path());
        let file = match std::fs::OpenOptions::new().write(true).open(&object_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.existence_cache.remove(oid);
                return Ok(false);
            }
            Err(e) => return Err(StoreError::io(&object_path)(e)),
        };

        file.set_modified(SystemTime::now())
            .map_err(StoreError::io(&object_path))?;
        Ok(true)
    }

    /// Type of a stored object, decompressing only its header.
    fn stored_type(&self, oid: &ObjectId) -> Result<ObjectType, StoreError> {
        let object_path = self.path.join(oid.to_path());
        let file = std::fs::File::open(&object_path).map_err(StoreError::io(&object_path))?;
        let mut reader = BufReader::new(flate2::read::ZlibDecoder::new(file));

        ObjectType::parse_header(&mut reader)
            .map(|(object_type, _)| object_type)
            .map_err(|e| StoreError::Malformed {
                oid: oid.clone(),
                reason: e.to_string(),
            })
    }

    pub fn parse_object(&self, oid: &ObjectId) -> Result<ObjectBox, StoreError> {
        let (object_type, reader) = self.parse_object_as_bytes(oid)?;
        let malformed = |e: anyhow::Error| StoreError::Malformed {
            oid: oid.clone(),
            reason: e.to_string(),
        };

        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(reader).map_err(malformed)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(Tree::deserialize(reader).map_err(malformed)?)),
            ObjectType::Commit => {
                ObjectBox::Commit(Box::new(Commit::deserialize(reader).map_err(malformed)?))
            }
        })
    }

    pub fn load_blob(&self, oid: &ObjectId) -> Result<Blob, StoreError> {
        match self.parse_object(oid)? {
            ObjectBox::Blob(blob) => Ok(*blob),
            other => Err(self.unexpected(oid, ObjectType::Blob, other.object_type())),
        }
    }

    pub fn load_tree(&self, oid: &ObjectId) -> Result<Tree, StoreError> {
        match self.parse_object(oid)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            other => Err(self.unexpected(oid, ObjectType::Tree, other.object_type())),
        }
    }

    pub fn load_commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        match self.parse_object(oid)? {
            ObjectBox::Commit(commit) => Ok(*commit),
            other => Err(self.unexpected(oid, ObjectType::Commit, other.object_type())),
        }
    }

    fn unexpected(&self, oid: &ObjectId, expected: ObjectType, actual: ObjectType) -> StoreError {
        StoreError::UnexpectedType {
            oid: oid.clone(),
            expected,
            actual,
        }
    }

    /// Re-hash a stored object and report whether it still matches its key.
    pub fn verify_object(&self, oid: &ObjectId) -> Result<bool, StoreError> {
        let object = self.parse_object(oid)?;
        let recomputed = match &object {
            ObjectBox::Blob(blob) => blob.object_id(),
            ObjectBox::Tree(tree) => tree.object_id(),
            ObjectBox::Commit(commit) => commit.object_id(),
        }
        .map_err(|e| StoreError::Malformed {
            oid: oid.clone(),
            reason: e.to_string(),
        })?;

        if &recomputed != oid {
            warn!(oid = %oid, recomputed = %recomputed, "stored object fails re-hash");
        }
        Ok(&recomputed == oid)
    }

    fn parse_object_as_bytes(&self, oid: &ObjectId) -> Result<(ObjectType, Cursor<Bytes>), StoreError> {
        let object_path = self.path.join(oid.to_path());
        let content = self.read_object(oid, &object_path)?;
        let total = content.len();
        let mut reader = Cursor::new(content);

        let (object_type, size) =
            ObjectType::parse_header(&mut reader).map_err(|e| StoreError::Malformed {
                oid: oid.clone(),
                reason: e.to_string(),
            })?;

        let payload_len = total - reader.position() as usize;
        if payload_len != size {
            return Err(StoreError::Malformed {
                oid: oid.clone(),
                reason: format!("header declares {size} bytes, payload has {payload_len}"),
            });
        }

        Ok((object_type, reader))
    }

    fn read_object(&self, oid: &ObjectId, object_path: &Path) -> Result<Bytes, StoreError> {
        let compressed = match std::fs::read(object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.existence_cache.remove(oid);
                return Err(StoreError::NotFound(oid.clone()));
            }
            Err(e) => return Err(StoreError::io(object_path)(e)),
        };

        Self::decompress(&compressed).map_err(|e| StoreError::Malformed {
            oid: oid.clone(),
            reason: format!("unable to decompress object: {e}"),
        })
    }

    fn write_object(&self, object_path: &Path, content: Bytes) -> Result<(), StoreError> {
        let object_dir = object_path.parent().ok_or_else(|| StoreError::Io {
            path: object_path.to_path_buf(),
            source: std::io::Error::other("object path has no parent"),
        })?;
        std::fs::create_dir_all(object_dir).map_err(StoreError::io(object_dir))?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let compressed = Self::compress(&content).map_err(StoreError::io(&temp_object_path))?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .map_err(StoreError::io(&temp_object_path))?;
        file.write_all(&compressed)
            .and_then(|_| file.sync_all())
            .map_err(StoreError::io(&temp_object_path))?;

        // rename the temp file into place so the object appears atomically
        std::fs::rename(&temp_object_path, object_path).map_err(StoreError::io(object_path))?;

        Ok(())
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(decompressed.into())
    }

    fn generate_temp_name() -> String {
        format!("{TEMP_PREFIX}{}", rand::random::<u32>())
    }

    /// Every object currently in the store.
    pub fn list_objects(&self) -> Result<Vec<ObjectId>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut oids = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.path.to_path_buf(),
                source: e.into(),
            })?;
            if let Some(oid) = self.oid_from_path(entry.path()) {
                oids.push(oid);
            }
        }
        oids.sort();

        Ok(oids)
    }

    fn oid_from_path(&self, path: &Path) -> Option<ObjectId> {
        let file_name = path.file_name()?.to_str()?;
        if file_name.starts_with(TEMP_PREFIX) {
            return None;
        }
        let dir_name = path.parent()?.file_name()?.to_str()?;
        ObjectId::try_parse(format!("{dir_name}{file_name}")).ok()
    }

    /// Sweep every object not in `live`
    ///
    /// Objects whose file is younger than `grace` are kept even when
    /// unreferenced, so content put by an in-flight upload survives until its
    /// commit lands.
    pub fn cleanup(&self, live: &HashSet<ObjectId>, grace: Duration) -> Result<CleanupReport, StoreError> {
        let mut report = CleanupReport::default();
        let horizon = SystemTime::now().checked_sub(grace);

        for oid in self.list_objects()? {
            report.scanned += 1;

            if live.contains(&oid) {
                report.retained += 1;
                continue;
            }

            let object_path = self.path.join(oid.to_path());
            let swept = self.with_write_lock(&oid, || -> Result<Option<u64>, StoreError> {
                let metadata = match std::fs::metadata(&object_path) {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                    Err(e) => return Err(StoreError::io(&object_path)(e)),
                };
                let modified = metadata.modified().map_err(StoreError::io(&object_path))?;
                if horizon.is_some_and(|horizon| modified > horizon) {
                    return Ok(None);
                }

                self.existence_cache.remove(&oid);
                std::fs::remove_file(&object_path).map_err(StoreError::io(&object_path))?;
                Ok(Some(metadata.len()))
            })?;

            match swept {
                Some(size) => {
                    report.reclaimed_bytes += size;
                    report.removed.push(oid);
                }
                None => report.deferred += 1,
            }
        }

        self.prune_empty_dirs()?;

        info!(
            scanned = report.scanned,
            removed = report.removed.len(),
            deferred = report.deferred,
            reclaimed_bytes = report.reclaimed_bytes,
            "object store cleanup finished"
        );

        Ok(report)
    }

    fn prune_empty_dirs(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.path).map_err(StoreError::io(&*self.path))? {
            let entry = entry.map_err(StoreError::io(&*self.path))?;
            let dir = entry.path();
            if dir.is_dir()
                && dir
                    .read_dir()
                    .map_err(StoreError::io(&dir))?
                    .next()
                    .is_none()
            {
                std::fs::remove_dir(&dir).map_err(StoreError::io(&dir))?;
            }
        }

        Ok(())
    }

    fn session_dir(&self, session: &str) -> Result<PathBuf, StoreError> {
        let valid = !session.is_empty()
            && session.len() <= MAX_SESSION_ID_LEN
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(self.uploads_path.join(session))
        } else {
            Err(StoreError::InvalidSession(session.to_string()))
        }
    }

    fn session_lock(&self, session: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Persist one chunk of a large upload. Re-sending an index replaces it.
    pub fn store_chunk(&self, session: &str, index: usize, content: Bytes) -> Result<(), StoreError> {
        let session_dir = self.session_dir(session)?;
        let lock = self.session_lock(session);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        std::fs::create_dir_all(&session_dir).map_err(StoreError::io(&session_dir))?;

        let chunk_path = session_dir.join(format!("{index:08}"));
        let temp_path = session_dir.join(Self::generate_temp_name());
        std::fs::write(&temp_path, &content).map_err(StoreError::io(&temp_path))?;
        std::fs::rename(&temp_path, &chunk_path).map_err(StoreError::io(&chunk_path))?;

        debug!(session, index, size = content.len(), "stored upload chunk");
        Ok(())
    }

    /// Concatenate a session's chunks `0..total` and store the result as one object.
    pub fn assemble_chunks(
        &self,
        session: &str,
        total: usize,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome, StoreError> {
        let session_dir = self.session_dir(session)?;
        let lock = self.session_lock(session);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let chunks = self.list_chunks(&session_dir)?;
        let complete =
            total > 0 && chunks.len() == total && chunks.keys().copied().eq(0..total);
        if !complete {
            return Err(StoreError::IncompleteUpload {
                session: session.to_string(),
                expected: total,
                found: chunks.len(),
            });
        }

        let mut content = Vec::new();
        for index in 0..total {
            let chunk_path = &chunks[&index];
            let chunk = std::fs::read(chunk_path).map_err(StoreError::io(chunk_path))?;
            content.extend_from_slice(&chunk);
        }

        let outcome = self.put(content.into(), metadata)?;
        std::fs::remove_dir_all(&session_dir).map_err(StoreError::io(&session_dir))?;
        self.session_locks.remove(session);

        info!(session, oid = %outcome.oid, chunks = total, size = outcome.size, "assembled upload");
        Ok(outcome)
    }

    /// Drop a session's pending chunks.
    pub fn discard_session(&self, session: &str) -> Result<(), StoreError> {
        let session_dir = self.session_dir(session)?;
        let lock = self.session_lock(session);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if session_dir.exists() {
            std::fs::remove_dir_all(&session_dir).map_err(StoreError::io(&session_dir))?;
        }
        Ok(())
    }

    fn list_chunks(&self, session_dir: &Path) -> Result<std::collections::BTreeMap<usize, PathBuf>, StoreError> {
        let mut chunks = std::collections::BTreeMap::new();
        if !session_dir.exists() {
            return Ok(chunks);
        }

        for entry in std::fs::read_dir(session_dir).map_err(StoreError::io(session_dir))? {
            let entry = entry.map_err(StoreError::io(session_dir))?;
            let index = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<usize>().ok());
            if let Some(index) = index {
                chunks.insert(index, entry.path());
            }
        }

        Ok(chunks)
    }

    /// Ingest one batch transaction
    ///
    /// Digests already present are skipped without touching `payloads`.
    pub fn ingest_batch(&self, batch: &BatchIngest, payloads: &HashMap<ObjectId, Bytes>) -> BatchReport {
        let report = batch
            .objects
            .iter()
            .map(|(oid, metadata)| (oid.clone(), self.ingest_one(oid, metadata, payloads.get(oid))))
            .collect::<BatchReport>();

        let unresolved = batch
            .files
            .iter()
            .filter(|(_, oid)| match report.outcome(oid) {
                Some(IngestOutcome::Failed(_)) => true,
                Some(_) => false,
                None => !self.exists(oid),
            })
            .map(|(path, _)| path.clone())
            .collect::<Vec<_>>();

        info!(
            stored = report.stored,
            skipped = report.skipped,
            failed = report.failed,
            unresolved = unresolved.len(),
            "batch ingested"
        );

        report.with_unresolved_paths(unresolved)
    }

    fn ingest_one(&self, oid: &ObjectId, metadata: &ObjectMetadata, payload: Option<&Bytes>) -> IngestOutcome {
        if self.retain_existing(oid) {
            return IngestOutcome::Skipped;
        }

        let Some(payload) = payload else {
            return IngestOutcome::Failed("payload missing".to_string());
        };

        let actual = ObjectId::digest(payload);
        if &actual != oid {
            return IngestOutcome::Failed(
                StoreError::DigestMismatch {
                    expected: oid.clone(),
                    actual,
                }
                .to_string(),
            );
        }

        match self.put(payload.clone(), metadata) {
            Ok(outcome) if outcome.newly_stored => IngestOutcome::Stored { size: outcome.size },
            Ok(_) => IngestOutcome::Skipped,
            Err(e) => IngestOutcome::Failed(e.to_string()),
        }
    }
}
