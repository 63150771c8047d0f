//! Per-instance accessors for declared relations.
//!
//! Each accessor borrows the instance it was created from. Every operation
//! that writes requires the instance to be flushed, and any instance passed
//! in must be a flushed instance of the relation's companion model.

mod many;
pub use many::ManyRelation;

mod multi;
pub use multi::MultiRelation;

mod single;
pub use single::SingleRelation;

use crate::Instance;

use crumpet_core::{stmt::Value, Error, Result};

/// Accessor for a relation of any shape, as returned by
/// [`Instance::relation`].
#[derive(Debug)]
pub enum RelationAccessor<'a> {
    Single(SingleRelation<'a>),
    Many(ManyRelation<'a>),
    Multi(MultiRelation<'a>),
}

impl RelationAccessor<'_> {
    pub fn name(&self) -> &str {
        match self {
            RelationAccessor::Single(accessor) => accessor.name(),
            RelationAccessor::Many(accessor) => accessor.name(),
            RelationAccessor::Multi(accessor) => accessor.name(),
        }
    }
}

/// Row id of `instance`, which must be a flushed instance of `companion`.
fn require_companion<'b>(instance: &'b Instance, companion: &str) -> Result<&'b Value> {
    if instance.model().name != companion {
        return Err(Error::model_mismatch(companion, &instance.model().name));
    }

    instance.require_persisted()
}

fn collect_keys<I>(keys: I) -> Vec<Value>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    keys.into_iter().map(Into::into).collect()
}
