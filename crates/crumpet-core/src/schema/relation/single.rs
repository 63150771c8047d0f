use super::{mismatch, primary_key, RelationType};
use crate::{schema::Schema, Result};

/// One participant stores a foreign key referencing the other's primary key.
///
/// When `is_left` is set the owner stores the key; otherwise this is the
/// reverse side of a one-to-one relation and the companion stores it.
#[derive(Debug, Clone)]
pub struct Single {
    pub name: String,
    pub ty: RelationType,
    pub owner: String,
    pub companion: String,
    pub is_left: bool,
    pub foreign_key: String,
}

impl Single {
    /// Model whose table holds the foreign key column.
    pub fn storing_model(&self) -> &str {
        if self.is_left {
            &self.owner
        } else {
            &self.companion
        }
    }

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

        if self.is_left {
            let companion_pk = primary_key(schema, &self.companion)?;
            Ok(format!(
                "{to_alias}.{companion_pk} = {}.{}",
                self.owner, self.foreign_key
            ))
        } else {
            let owner_pk = primary_key(schema, &self.owner)?;
            Ok(format!(
                "{to_alias}.{} = {}.{owner_pk}",
                self.foreign_key, self.owner
            ))
        }
    }
}
