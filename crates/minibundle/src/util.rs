//! Path helpers shared by the resolver and the code generator

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment without touching the filesystem.
///
/// A leading `..` on a relative path is kept, a `..` directly under the root
/// is dropped (`/..` is `/`).
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let last = normalized.components().next_back();
                match last {
                    Some(Component::Normal(_)) => {
                        normalized.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    Some(Component::ParentDir | Component::CurDir) | None => {
                        normalized.push("..");
                    }
                }
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }

    normalized
}

/// Render `path` relative to `root` with forward slashes when it lives under
/// it, otherwise the full path.
pub fn display_relative(path: &Path, root: Option<&Path>) -> String {
    let shown = root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);

    let mut rendered = String::new();
    if shown.has_root() {
        rendered.push('/');
    }
    let segments: Vec<_> = shown
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();
    rendered.push_str(&segments.join("/"));
    rendered
}
