//! Fuzz harness for the tool metadata database (tools_metadata.yml)

#![no_main]

use gxtdb_schema::tool::ToolDatabase;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(db) = serde_yaml::from_str::<ToolDatabase>(input) else {
        return;
    };
    // Derived views must not panic on anything that deserializes.
    for tool in db.tools.values() {
        let _ = tool.latest_version();
        let _ = tool.latest_test_results();
        let _ = tool.versions_newest_first();
    }
    let _ = serde_yaml::to_string(&db);
});
