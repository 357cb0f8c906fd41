//! Document discovery: when no paths are given on the command line, walk the
//! invocation directory for `.org` files, skipping a few well-known
//! generated/vendored directory names.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXCLUDED_DIRS: &[&str] = &["node_modules", "scripts", "dist"];
const SOURCE_EXT: &str = "org";

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Recursively find every `.org` file under `root`, in a deterministic
/// (sorted) order so discovery doesn't depend on filesystem iteration order.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(SOURCE_EXT))
        .map(|e| e.path().to_path_buf())
        .collect();
    found.sort();
    found
}
