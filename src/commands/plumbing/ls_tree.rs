use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectBox;

impl Repository {
    /// List a tree, given the tree itself, a commit or a branch name.
    pub fn ls_tree(&mut self, revision: &str) -> anyhow::Result<()> {
        let oid = self.resolve_revision(revision)?;

        let tree = match self.database().parse_object(&oid)? {
            ObjectBox::Commit(commit) => self.database().load_tree(commit.tree_oid())?,
            ObjectBox::Tree(tree) => *tree,
            ObjectBox::Blob(_) => anyhow::bail!("{} is a blob, not a tree", oid),
        };

        for entry in tree.entries() {
            writeln!(
                self.writer(),
                "{} {} {} {:>10}\t{}",
                entry.mode.as_str(),
                entry.kind.as_str(),
                entry.oid,
                entry.size,
                entry.path
            )?;
        }

        Ok(())
    }
}
