//! Input and output plumbing shared by gxtdb adapters.
//!
//! - [`uri`]: read a local path or an `http(s)://` URL into memory.
//! - [`table`]: comma- or tab-delimited spreadsheets, chosen by extension.
//! - [`walk`]: recursive file discovery that skips hidden directories.

pub mod table;
pub mod uri;
pub mod walk;

pub use table::{Delimiter, Table, read_table, write_table};
pub use uri::{is_url, read_uri};
pub use walk::walk_files;
