use super::{mismatch, primary_key, RelationType};
use crate::{schema::Schema, Result};

/// The companion stores a non-unique foreign key back to the owner.
#[derive(Debug, Clone)]
pub struct Many {
    pub name: String,
    pub ty: RelationType,
    pub owner: String,
    pub companion: String,
    pub is_left: bool,
    pub foreign_key: String,
}

impl Many {
    pub fn join_condition(
        &self,
        schema: &Schema,
        from: &str,
        to: &str,
        to_alias: &str,
    ) -> Result<String> {
        if from != self.owner || to != self.companion {
            return Err(mismatch(&self.owner, &self.companion, from, to));
        }

        let owner_pk = primary_key(schema, &self.owner)?;
        Ok(format!(
            "{to_alias}.{} = {}.{owner_pk}",
            self.foreign_key, self.owner
        ))
    }
}
