//! Built-in rules
//!
//! `internal` rules run first in every policy; the remaining modules hold the
//! rules specific to one trust model.

pub mod calendar;
pub mod internal;
pub mod key;
pub mod publication;

use crate::result::RuleResult;
use tessera_core::TesseraError;

/// A structural fault while recomputing a chain fails the rule
fn fail_on(err: TesseraError) -> RuleResult {
    RuleResult::fail(err.code(), err.to_string())
}
