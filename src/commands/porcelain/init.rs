use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;

impl Repository {
    pub fn init(&mut self) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .hoard/objects directory")?;

        fs::create_dir_all(self.database().uploads_path())
            .context("Failed to create .hoard/uploads directory")?;

        fs::create_dir_all(self.graph().refs().heads_path(self.project()))
            .context("Failed to create project refs directory")?;

        fs::create_dir_all(self.hoard_path().join("integrity"))
            .context("Failed to create .hoard/integrity directory")?;

        writeln!(
            self.writer(),
            "Initialized empty hoard repository in {}",
            self.path().display()
        )?;

        Ok(())
    }
}
