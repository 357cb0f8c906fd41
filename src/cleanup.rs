//! Post-tangle cache cleanup: removes stale TypeScript build-info files from
//! a previous tangle run's output directory. Permission errors are logged
//! and tolerated rather than surfaced as failures.

use std::path::Path;
use walkdir::WalkDir;

fn is_build_info(file_name: &str) -> bool {
    file_name == "tsconfig.tsbuildinfo" || file_name.ends_with(".tsbuildinfo")
}

/// Walk `out_dir` deleting build-info files. Returns the count removed.
/// If `out_dir` doesn't exist yet, there is nothing to clean.
pub fn clean(out_dir: &Path) -> usize {
    if !out_dir.exists() {
        return 0;
    }

    let mut removed = 0;
    for entry in WalkDir::new(out_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_build_info(name) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), error = %err, "cache cleanup: could not remove file");
            }
        }
    }
    removed
}
