mod many;
pub use many::Many;

mod multi;
pub use multi::Multi;

mod single;
pub use single::Single;

use super::Schema;
use crate::{Error, Result};

/// Relation type tag, as declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// One edge of the relation graph, seen from its owning model.
#[derive(Debug, Clone)]
pub enum Relation {
    /// One side stores a foreign key referencing the other's primary key
    Single(Single),

    /// The companion stores a foreign key back to the owner
    Many(Many),

    /// A pivot model stores a foreign key to each side
    Multi(Multi),
}

impl Relation {
    pub fn name(&self) -> &str {
        match self {
            Relation::Single(rel) => &rel.name,
            Relation::Many(rel) => &rel.name,
            Relation::Multi(rel) => &rel.name,
        }
    }

    pub fn ty(&self) -> RelationType {
        match self {
            Relation::Single(rel) => rel.ty,
            Relation::Many(rel) => rel.ty,
            Relation::Multi(rel) => rel.ty,
        }
    }

    /// Model the relation is registered on.
    pub fn owner(&self) -> &str {
        match self {
            Relation::Single(rel) => &rel.owner,
            Relation::Many(rel) => &rel.owner,
            Relation::Multi(rel) => &rel.owner,
        }
    }

    /// Model on the other end of the edge.
    pub fn companion(&self) -> &str {
        match self {
            Relation::Single(rel) => &rel.companion,
            Relation::Many(rel) => &rel.companion,
            Relation::Multi(rel) => &rel.companion,
        }
    }

    pub fn is_left(&self) -> bool {
        match self {
            Relation::Single(rel) => rel.is_left,
            Relation::Many(rel) => rel.is_left,
            Relation::Multi(rel) => rel.is_left,
        }
    }

    /// Returns `true` if joining the relation can yield several rows per owner
    /// row.
    pub fn multiplies_rows(&self) -> bool {
        match self {
            Relation::Single(rel) => !rel.is_left,
            Relation::Many(_) | Relation::Multi(_) => true,
        }
    }

    pub fn as_single(&self) -> Option<&Single> {
        match self {
            Relation::Single(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&Many> {
        match self {
            Relation::Many(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&Multi> {
        match self {
            Relation::Multi(rel) => Some(rel),
            _ => None,
        }
    }

    /// SQL condition joining `from` (referenced by its table name) to `to`
    /// (referenced as `to_alias`).
    ///
    /// Fails with a model mismatch error unless `from` and `to` are a pair of
    /// models this edge connects.
    pub fn join_condition(
        &self,
        schema: &Schema,
        from: &str,
        to: &str,
        to_alias: &str,
    ) -> Result<String> {
        match self {
            Relation::Single(rel) => rel.join_condition(schema, from, to, to_alias),
            Relation::Many(rel) => rel.join_condition(schema, from, to, to_alias),
            Relation::Multi(rel) => rel.join_condition(schema, from, to, to_alias),
        }
    }
}

fn mismatch(expected_from: &str, expected_to: &str, from: &str, to: &str) -> Error {
    Error::model_mismatch(
        format!("{expected_from} -> {expected_to}"),
        format!("{from} -> {to}"),
    )
}

fn primary_key<'a>(schema: &'a Schema, model: &str) -> Result<&'a str> {
    Ok(schema.model(model)?.primary_key_name())
}
