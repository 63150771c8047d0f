use crate::{Error, Result};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Returns `true` if `name` can be used as a model, field or relation name.
pub fn is_valid_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::invalid_name(name))
    }
}
