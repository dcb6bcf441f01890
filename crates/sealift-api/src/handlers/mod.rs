pub mod files;
pub mod upload;

use sealift_common::error::{Result, SealiftError};

pub(crate) fn require(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SealiftError::Validation(format!("{name} is required")));
    }
    Ok(())
}
