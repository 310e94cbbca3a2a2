use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    pub fn cat_file(&mut self, object_id: &str) -> anyhow::Result<()> {
        let oid = ObjectId::try_parse(object_id)?;
        let object = self.database().parse_object(&oid)?;

        write!(self.writer(), "{}", object.display())?;

        Ok(())
    }
}
