use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use colored::Colorize;

impl Repository {
    pub fn list_branches(&mut self) -> anyhow::Result<()> {
        for branch in self.graph().list_branches(self.project())? {
            let head = self.graph().head(self.project(), &branch)?;
            let head = head.map(|oid| oid.to_short_oid()).unwrap_or_default();

            if &branch == self.branch_name() {
                writeln!(self.writer(), "* {} {}", branch.to_string().green(), head)?;
            } else {
                writeln!(self.writer(), "  {} {}", branch, head)?;
            }
        }

        Ok(())
    }

    /// Create `branch_name` at `source` (a branch or commit id), defaulting to the current branch head.
    pub fn create_branch(&mut self, branch_name: &str, source: Option<&str>) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(branch_name)?;

        let source_oid = match source {
            Some(source) => self.resolve_revision(source)?,
            None => self
                .graph()
                .head(self.project(), self.branch_name())?
                .ok_or_else(|| anyhow::anyhow!("no commits on {} to branch from", self.branch_name()))?,
        };

        self.graph()
            .create_branch(self.project(), &branch_name, &source_oid)?;
        writeln!(
            self.writer(),
            "Created branch {} at {}",
            branch_name,
            source_oid.to_short_oid()
        )?;

        Ok(())
    }

    pub fn delete_branch(&mut self, branch_name: &str) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(branch_name)?;
        if &branch_name == self.branch_name() {
            anyhow::bail!("cannot delete the current branch {}", branch_name);
        }

        let oid = self.graph().delete_branch(self.project(), &branch_name)?;
        writeln!(
            self.writer(),
            "Deleted branch {} (was {})",
            branch_name,
            oid.to_short_oid()
        )?;

        Ok(())
    }
}
