use crate::areas::commit_graph::CommitRequest;
use crate::areas::repository::Repository;
use crate::artifacts::analyzer::asset_type::AssetFormat;
use crate::artifacts::analyzer::dependency::display_path;
use crate::artifacts::database::object_metadata::ObjectMetadata;
use crate::artifacts::objects::entry_mode::EntryKind;
use crate::artifacts::objects::tree::TreeEntry;
use anyhow::Context;

impl Repository {
    /// Snapshot the whole working copy onto the configured branch.
    pub fn commit(&mut self, message: &str, analytics: bool) -> anyhow::Result<()> {
        let author = self.config().require_author()?.clone();
        let message = message.trim().to_string();
        if message.is_empty() {
            anyhow::bail!("commit message cannot be empty");
        }

        let mut files = Vec::new();
        for path in self.workspace().list_files(None)? {
            let content = self
                .workspace()
                .read_file(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_path = display_path(&path);
            let stored = self
                .database()
                .put(content, &ObjectMetadata::for_path(file_path.clone()))?;

            let kind = if AssetFormat::from_path(&path).is_recognized() {
                EntryKind::Asset
            } else {
                EntryKind::Blob
            };
            files.push(TreeEntry::new(
                file_path,
                stored.oid,
                stored.size,
                self.workspace().file_mode(&path),
                kind,
            ));
        }

        let request = CommitRequest::new(self.project().clone(), author, message, files)
            .at(self.config().timestamp);
        let (commit_id, commit) = self.graph().commit_to_branch(self.branch_name(), request)?;

        let is_root = if commit.is_root() { "(root-commit) " } else { "" };
        writeln!(
            self.writer(),
            "[{} {}{}] {}",
            self.branch_name(),
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        if analytics {
            let record = self.analytics_for_commit(self.project(), &commit_id)?;
            writeln!(self.writer(), "{}", serde_json::to_string_pretty(&record)?)?;
        }

        Ok(())
    }
}
