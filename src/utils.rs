//! Small helpers shared by the report writers and the binary.

use std::fs;
use std::path::Path;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::Result;

/// Formats an amount with exactly two fractional digits, rounding half-up.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Creates the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
