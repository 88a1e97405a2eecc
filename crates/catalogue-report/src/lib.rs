//! Log-friendly failure reports.
//!
//! Turns a caught failure (and its root cause, when it has one) into indented
//! multi-line text, and trims stack-frame strings down to `file:line`.

mod location;
mod report;

pub use location::caller_location;
pub use report::{Failure, Reportable, format_failure};
