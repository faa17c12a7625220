//! Incoming form payloads and their validation glue.
use validator::ValidationError;

use crate::validation::{is_valid_email, is_valid_phone};

pub mod submissions;

/// The site-wide loose email check, bridged into `validator`. Empty values
/// pass so the check composes with optional fields.
pub fn loose_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_valid_email(value) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Loose phone check, same empty-passes contract as [`loose_email`].
pub fn loose_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_valid_phone(value) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}
