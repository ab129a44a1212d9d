//! Fuzz harness for tool version ordering

#![no_main]

use gxtdb_version::ToolVersion;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let (left, right) = input.split_once('\n').unwrap_or((input, ""));
    let a = ToolVersion::parse(left);
    let b = ToolVersion::parse(right);
    assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
});
