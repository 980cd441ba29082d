//! Web path normalization.
//!
//! Bundle paths are URL-like strings (`/js/lib/app.js`), independent of the
//! host platform. Generated resources carry a prefix such as `jar:` or
//! `messages:` which must survive joining untouched.

/// Collapse repeated separators, convert backslashes and strip leading and
/// trailing `/`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize and make the path absolute. A trailing `/` is kept so directory
/// paths stay recognizable.
pub fn as_path(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized.is_empty() {
        return "/".to_string();
    }

    if path.ends_with('/') || path.ends_with('\\') {
        format!("/{normalized}/")
    } else {
        format!("/{normalized}")
    }
}

/// Join a directory and an entry name.
///
/// For generated resources the directory is kept verbatim (up to a trailing
/// `/`) so its generator prefix is preserved.
pub fn join_paths(dir: &str, name: &str, generated: bool) -> String {
    if generated {
        let name = normalize_path(name);
        if dir.ends_with(':') {
            return format!("{dir}{name}");
        }
        return format!("{}/{name}", dir.trim_end_matches('/'));
    }

    as_path(&format!("{dir}/{name}"))
}

/// [`as_path`] for regular resources, identity for generated ones.
pub(crate) fn as_resource_path(path: &str, generated: bool) -> String {
    if generated {
        path.to_string()
    } else {
        as_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/js//lib/"), "js/lib");
        assert_eq!(normalize_path("js\\lib\\a.js"), "js/lib/a.js");
        assert_eq!(normalize_path("///"), "");
    }

    #[test]
    fn test_as_path_keeps_directory_marker() {
        assert_eq!(as_path("js/app.js"), "/js/app.js");
        assert_eq!(as_path("js//lib/"), "/js/lib/");
        assert_eq!(as_path(""), "/");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/js/lib/", "a.js", false), "/js/lib/a.js");
        assert_eq!(join_paths("/js/lib", "/sub/", false), "/js/lib/sub/");
        assert_eq!(join_paths("jar:/bundles/", "a.js", true), "jar:/bundles/a.js");
        assert_eq!(join_paths("messages:", "app", true), "messages:app");
    }
}
