//! Canonical data model for the gxtdb tool database.
//!
//! Defines test result records and sets, the persisted tool metadata
//! database, panel skeletons, and the wire shapes of the two remote inputs
//! (Galaxy tool listings and test execution reports).
//! All other crates depend on these types.

pub mod galaxy;
pub mod ids;
pub mod panel;
pub mod report;
pub mod results;
pub mod tool;
