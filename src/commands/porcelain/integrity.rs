use crate::areas::repository::Repository;
use crate::artifacts::integrity::IntegrityCheckResult;
use crate::artifacts::integrity::state::IntegrityState;
use colored::Colorize;
use std::path::PathBuf;

impl Repository {
    pub async fn track(&mut self, files: &[String]) -> anyhow::Result<()> {
        for file in files {
            let path = self.workspace().relativize(file.as_ref())?;
            let record = self.integrity().track_asset(&path, self.config().actor()).await?;

            writeln!(
                self.writer(),
                "tracking {} ({}, {} criticality, health {:.0})",
                record.path,
                record.asset_type,
                record.criticality,
                record.health_score
            )?;
        }

        Ok(())
    }

    /// Verify the given files, or every tracked asset; fails if any asset is left unhealthy.
    pub async fn verify(&mut self, files: &[String]) -> anyhow::Result<()> {
        let paths = if files.is_empty() {
            self.integrity()
                .tracked_paths()?
                .into_iter()
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        } else {
            files
                .iter()
                .map(|file| self.workspace().relativize(file.as_ref()))
                .collect::<anyhow::Result<Vec<_>>>()?
        };

        let results = self
            .integrity()
            .verify_many(&paths, self.config().actor())
            .await;

        let mut unhealthy = 0;
        for (path, result) in results {
            match result.and_then(IntegrityCheckResult::into_result) {
                Ok(result) => self.print_check_result(&result)?,
                Err(e) => {
                    unhealthy += 1;
                    writeln!(self.writer(), "{} {}: {}", "error".red(), path.display(), e)?;
                }
            }
        }

        if unhealthy > 0 {
            anyhow::bail!("{unhealthy} of {} assets need attention", paths.len());
        }

        Ok(())
    }

    fn print_check_result(&self, result: &IntegrityCheckResult) -> anyhow::Result<()> {
        let status = match (result.status, result.recovery) {
            (IntegrityState::Valid, Some(method)) => format!("recovered ({method})").yellow(),
            (IntegrityState::Valid, None) => "ok".green(),
            (status, _) => status.as_str().red(),
        };

        writeln!(
            self.writer(),
            "{} {} (health {:.0})",
            status,
            result.path,
            result.health_score
        )?;

        Ok(())
    }

    pub async fn restore(&mut self, file: &str) -> anyhow::Result<()> {
        let path = self.workspace().relativize(file.as_ref())?;
        let record = self
            .integrity()
            .restore_from_backup(&path, self.config().actor())
            .await?;

        writeln!(self.writer(), "restored {} from backup", record.path)?;

        Ok(())
    }

    pub async fn resolve(&mut self, file: &str) -> anyhow::Result<()> {
        let path = self.workspace().relativize(file.as_ref())?;
        let record = self
            .integrity()
            .resolve_manual_intervention(&path, self.config().actor())
            .await?;

        writeln!(self.writer(), "accepted current content of {}", record.path)?;

        Ok(())
    }
}
