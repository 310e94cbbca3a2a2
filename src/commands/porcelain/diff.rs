use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{ChangeKind, DiffFilter, FileDiff};
use crate::artifacts::objects::tree::TreeEntry;
use colored::Colorize;

impl Repository {
    /// Print the files that differ between two commits or branches.
    pub fn diff(&mut self, from: &str, to: &str, filter: Option<&str>) -> anyhow::Result<()> {
        let filter = match filter {
            Some(filter) => DiffFilter::try_parse(filter)
                .ok_or_else(|| anyhow::anyhow!("invalid diff filter {filter:?}, expected letters from ADM"))?,
            None => DiffFilter::default(),
        };
        let from = self.resolve_revision(from)?;
        let to = self.resolve_revision(to)?;

        for file_diff in self.graph().diff_filtered(self.project(), &from, &to, filter)? {
            self.print_file_diff(&file_diff)?;
        }

        Ok(())
    }

    fn print_file_diff(&self, file_diff: &FileDiff) -> anyhow::Result<()> {
        let status = file_diff.kind.status_char().to_string();
        let status = match file_diff.kind {
            ChangeKind::Added => status.green(),
            ChangeKind::Deleted => status.red(),
            ChangeKind::Modified => status.yellow(),
        };

        let short = |entry: Option<&TreeEntry>| {
            entry.map_or_else(|| "-".repeat(8), |entry| entry.oid.to_short_oid())
        };

        writeln!(
            self.writer(),
            "{}\t{}\t{}..{}",
            status,
            file_diff.path,
            short(file_diff.old.as_ref()),
            short(file_diff.new.as_ref())
        )?;

        Ok(())
    }
}
