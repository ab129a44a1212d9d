use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files under `root` accepted by `keep`, in a stable order.
///
/// Directories whose names start with `.` are not descended into. The root
/// itself is always walked.
pub fn walk_files<F>(root: &Path, keep: F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| keep(path))
        .collect()
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

/// Whether `path` has one of `extensions` (without the dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    #[test]
    fn walks_sorted_and_skips_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.json");
        touch(dir.path(), "a/c.json");
        touch(dir.path(), ".git/d.json");
        touch(dir.path(), "a/notes.txt");
        touch(dir.path(), ".hidden.json");

        let found: Vec<String> = walk_files(dir.path(), |p| has_extension(p, &["json"]))
            .into_iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(found, vec![".hidden.json", "a/c.json", "b.json"]);
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".reports");
        touch(&root, "x.json");
        assert_eq!(walk_files(&root, |_| true).len(), 1);
    }
}
