use crate::artifacts::integrity::record::IntegrityRecord;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::IntegrityError;
use fake::rand;
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON files under `.hoard/integrity`, one per tracked path
///
/// File names are the digest of the asset path so arbitrary paths map to
/// flat, fixed-length names.
#[derive(Debug)]
pub struct IntegrityRecords {
    path: Box<Path>,
}

impl IntegrityRecords {
    pub fn new(path: Box<Path>) -> Self {
        IntegrityRecords { path }
    }

    pub fn records_path(&self) -> &Path {
        &self.path
    }

    fn record_path(&self, asset_path: &str) -> PathBuf {
        self.path
            .join(format!("{}.json", ObjectId::digest(asset_path.as_bytes())))
    }

    pub fn load(&self, asset_path: &str) -> Result<Option<IntegrityRecord>, IntegrityError> {
        let path = self.record_path(asset_path);
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IntegrityError::io(path)(e)),
        }
    }

    pub fn save(&self, record: &IntegrityRecord) -> Result<(), IntegrityError> {
        std::fs::create_dir_all(&self.path).map_err(IntegrityError::io(self.path.to_path_buf()))?;

        let content = serde_json::to_vec_pretty(record)?;
        let path = self.record_path(&record.path);
        let temp_path = self.path.join(format!("tmp-record-{}", rand::random::<u32>()));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(IntegrityError::io(&temp_path))?;
        file.write_all(&content)
            .and_then(|_| file.sync_all())
            .map_err(IntegrityError::io(&temp_path))?;

        std::fs::rename(&temp_path, &path).map_err(IntegrityError::io(path))
    }

    /// Every persisted record, sorted by asset path.
    pub fn list(&self) -> Result<Vec<IntegrityRecord>, IntegrityError> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IntegrityError::io(self.path.to_path_buf())(e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(IntegrityError::io(self.path.to_path_buf()))?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = std::fs::read(&path).map_err(IntegrityError::io(&path))?;
            records.push(serde_json::from_slice::<IntegrityRecord>(&content)?);
        }
        records.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::analyzer::analyze_or_scan;
    use crate::artifacts::integrity::health::IntegrityPolicy;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_survive_a_reload() {
        let dir = assert_fs::TempDir::new().unwrap();
        let records = IntegrityRecords::new(dir.path().join("integrity").into_boxed_path());
        let bytes = b"/Game/Props/Rock";
        let analysis = analyze_or_scan(Path::new("Config/Props.ini"), bytes);
        let record = IntegrityRecord::new("Config/Props.ini", bytes, &analysis, &IntegrityPolicy::default(), Utc::now());

        assert_eq!(records.load("Config/Props.ini").unwrap(), None);
        records.save(&record).unwrap();

        assert_eq!(records.load("Config/Props.ini").unwrap(), Some(record.clone()));
        assert_eq!(records.list().unwrap(), vec![record]);
    }
}
