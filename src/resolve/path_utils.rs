// src/resolve/path_utils.rs

//! Helpers for turning resolved paths into stable, root-relative names.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` style prefixes), we
///   canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slashed(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(slashed(rel));
        }
    }

    None
}

/// Root-relative name used in banners and template keys.
///
/// Always starts with `/`; paths outside `root` fall back to their full,
/// slash-normalized form.
pub fn display_name(root: &Path, path: &Path) -> String {
    let rel = relative_str(root, path).unwrap_or_else(|| slashed(path));
    if rel.starts_with('/') {
        rel
    } else {
        format!("/{rel}")
    }
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_rooted_and_slashed() {
        let root = Path::new("/srv/app");
        assert_eq!(
            display_name(root, Path::new("/srv/app/js/templates/a.html")),
            "/js/templates/a.html"
        );
    }

    #[test]
    fn display_name_for_dot_root() {
        assert_eq!(display_name(Path::new("."), Path::new("./css/site.css")), "/css/site.css");
    }
}
