use super::Db;
use crate::Result;

use crumpet_core::{
    schema::{ModelDef, ModelOptions},
    Connection, Schema,
};

/// Collects model definitions before the schema is frozen into a [`Db`].
#[derive(Debug, Default)]
pub struct Builder {
    schema: Schema,
}

impl Builder {
    /// Declare a new model. See [`Schema::define_model`].
    pub fn define_model(&mut self, name: &str, options: ModelOptions) -> Result<ModelDef<'_>> {
        self.schema.define_model(name, options)
    }

    /// Continue defining an existing model, e.g. to add relations once the
    /// companion model exists.
    pub fn model_mut(&mut self, name: &str) -> Result<ModelDef<'_>> {
        self.schema.model_mut(name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Freeze the schema. The returned `Db` has no connection yet.
    pub fn build(self) -> Db {
        Db::new(self.schema)
    }

    /// Freeze the schema and use `connection` as the active connection.
    pub async fn build_with(self, connection: impl Connection) -> Result<Db> {
        let db = self.build();
        db.set_connection(Box::new(connection)).await?;
        Ok(db)
    }

    /// Freeze the schema and connect to the database at `url`, e.g.
    /// `sqlite::memory:`.
    pub async fn connect(self, url: &str) -> Result<Db> {
        let connection = super::connect(url)?;
        let db = self.build();
        db.set_connection(connection).await?;
        Ok(db)
    }
}
