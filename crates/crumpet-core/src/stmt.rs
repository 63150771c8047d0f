mod params;
pub use params::{Params, Placeholder};

mod record;
pub use record::{Record, Row};

mod value;
pub use value::Value;
