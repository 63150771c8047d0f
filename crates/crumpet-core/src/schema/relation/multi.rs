use super::{mismatch, primary_key, RelationType};
use crate::{schema::Schema, Result};

/// A pivot model stores one foreign key to each side.
#[derive(Debug, Clone)]
pub struct Multi {
    pub name: String,
    pub ty: RelationType,
    pub owner: String,
    pub companion: String,
    pub is_left: bool,

    /// Pivot model name
    pub pivot: String,

    /// Pivot column referencing the owner
    pub my_foreign_key: String,

    /// Pivot column referencing the companion
    pub other_foreign_key: String,
}

impl Multi {
    pub fn join_condition(
        &self,
        schema: &Schema,
        from: &str,
        to: &str,
        to_alias: &str,
    ) -> Result<String> {
        if from == self.owner && to == self.pivot {
            let owner_pk = primary_key(schema, &self.owner)?;
            Ok(format!(
                "{to_alias}.{} = {}.{owner_pk}",
                self.my_foreign_key, self.owner
            ))
        } else if from == self.owner && to == self.companion {
            let owner_pk = primary_key(schema, &self.owner)?;
            let companion_pk = primary_key(schema, &self.companion)?;
            Ok(format!(
                "{to_alias}.{companion_pk} IN (SELECT {pivot}.{other} FROM {pivot} WHERE {pivot}.{mine} = {owner}.{owner_pk})",
                pivot = self.pivot,
                other = self.other_foreign_key,
                mine = self.my_foreign_key,
                owner = self.owner,
            ))
        } else if from == self.pivot && to == self.companion {
            let companion_pk = primary_key(schema, &self.companion)?;
            Ok(format!(
                "{to_alias}.{companion_pk} = {}.{}",
                self.pivot, self.other_foreign_key
            ))
        } else {
            Err(mismatch(&self.owner, &self.companion, from, to))
        }
    }
}
