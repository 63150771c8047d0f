mod db;
pub use db::{Builder, Db};

mod find;
pub use find::{FindOptions, FindResult, Joined, PivotFindResult};

mod instance;
pub use instance::{Instance, Member};

mod model;
pub use model::ModelHandle;

pub mod relation;
pub use relation::{ManyRelation, MultiRelation, RelationAccessor, SingleRelation};

pub use crumpet_core::{
    bail, err, record,
    schema::{
        FieldSpec, FieldType, ManyToManyOptions, ModelDef, ModelOptions, RelationOptions, SortEntry,
    },
    stmt::{Record, Value},
    Connection, Error, Result, Schema,
};

pub use serde_json::json;

pub mod driver {
    pub use crumpet_core::driver::*;
}
