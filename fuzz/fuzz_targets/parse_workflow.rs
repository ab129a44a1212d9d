//! Fuzz harness for workflow tool extraction (native and Format2)

#![no_main]

use gxtdb_workflows::{WorkflowFormat, parse_workflow};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let _ = parse_workflow(input, WorkflowFormat::Native);
    let _ = parse_workflow(input, WorkflowFormat::Format2);
});
