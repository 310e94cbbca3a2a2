use crate::areas::repository::Repository;
use std::time::Duration;

impl Repository {
    pub fn gc(&mut self, grace: Duration) -> anyhow::Result<()> {
        let report = self.cleanup(grace)?;

        writeln!(
            self.writer(),
            "scanned {} objects: removed {} ({} bytes), kept {}, deferred {}",
            report.scanned,
            report.removed.len(),
            report.reclaimed_bytes,
            report.retained,
            report.deferred
        )?;

        Ok(())
    }
}
