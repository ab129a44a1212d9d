//! Proptest strategies for gxtdb property-based testing
//!
//! Reusable generators for result sets, merge strategies and tool databases
//! across all gxtdb crates.

pub mod strategies;

pub use strategies::{
    strategy_datetime, strategy_merge_strategy, strategy_overlapping_pair, strategy_status,
    strategy_test_result, strategy_test_results, strategy_tool_database, strategy_tool_id,
    strategy_tool_metadata, strategy_version,
};
