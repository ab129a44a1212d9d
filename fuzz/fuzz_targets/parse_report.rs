//! Fuzz harness for Galaxy execution reports
//!
//! Parses arbitrary bytes as a report and, when that succeeds, groups the
//! entries into result sets and merges each set with itself under every
//! strategy.

#![no_main]

use gxtdb_ingest_results::ExecutionReport;
use gxtdb_merge::{MergeStrategy, merge};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(report) = ExecutionReport::parse(input) else {
        return;
    };
    for set in report.result_sets() {
        for strategy in MergeStrategy::ALL {
            let merged = merge(&set.results, &set.results, strategy);
            assert_eq!(merged.len(), set.results.len());
        }
    }
});
