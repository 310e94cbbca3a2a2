use crate::areas::repository::Repository;
use crate::artifacts::database::object_metadata::ObjectMetadata;
use crate::artifacts::analyzer::dependency::display_path;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;

impl Repository {
    pub fn hash_object(&mut self, object_path: &str, write: bool) -> anyhow::Result<()> {
        let path = self.workspace().relativize(object_path.as_ref())?;
        let content = self
            .workspace()
            .read_file(&path)
            .with_context(|| format!("Failed to read {object_path}"))?;

        let object_id = if write {
            self.database()
                .put(content, &ObjectMetadata::for_path(display_path(&path)))?
                .oid
        } else {
            ObjectId::digest(&content)
        };

        writeln!(self.writer(), "{}", object_id)?;

        Ok(())
    }
}
