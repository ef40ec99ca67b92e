//! Lexical path helpers for session files.
//!
//! Session documents store paths relative to the session file with `/`
//! separators, so sessions can be moved together with their trace.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` made absolute against the working directory, then normalized.
pub fn absolute(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize(&abs)
}

/// Path of `target` relative to the directory `base`.
///
/// Both paths are made absolute first. If they share no root (different
/// drives) the absolute target is returned.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = absolute(base);
    let target = absolute(target);

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();
    if base_parts.first() != target_parts.first() {
        return target;
    }

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &target_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dots() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
    }

    #[test]
    fn relative_path_siblings_and_parents() {
        assert_eq!(
            relative_path(Path::new("/work/sessions"), Path::new("/work/traces/game.json")),
            PathBuf::from("../traces/game.json")
        );
        assert_eq!(
            relative_path(Path::new("/work"), Path::new("/work/game.json")),
            PathBuf::from("game.json")
        );
    }

    #[test]
    fn relative_path_roundtrips_through_join() {
        let base = Path::new("/srv/a/b");
        let target = Path::new("/srv/c/d/trace.json");
        let rel = relative_path(base, target);
        assert_eq!(normalize(&base.join(rel)), target);
    }

    #[test]
    fn to_slash_joins_components() {
        assert_eq!(to_slash(Path::new("../traces/game.json")), "../traces/game.json");
    }
}
