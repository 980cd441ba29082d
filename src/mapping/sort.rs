//! `.sorting` file parsing.

use super::normalize::normalize_path;

/// Name of the per-directory ordering file.
pub const SORT_FILE_NAME: &str = ".sorting";

/// Parse a sort file against a directory listing.
///
/// Each non-blank, non-comment line names one entry of the directory. Entries
/// found in `remaining` are returned in file order and removed from
/// `remaining`, so the caller can append the rest in listing order. Unknown
/// or repeated names are skipped.
pub fn parse_sort_file(content: &str, remaining: &mut Vec<String>) -> Vec<String> {
    let mut sorted = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let name = normalize_path(line);
        if let Some(idx) = remaining
            .iter()
            .position(|available| normalize_path(available) == name)
        {
            sorted.push(remaining.remove(idx));
        } else {
            crate::debug_event!("sort", "unknown entry", "{line}");
        }
    }

    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_declared_entries_come_first() {
        let mut remaining = listing(&[".sorting", "a.js", "b.js", "c.js"]);
        let sorted = parse_sort_file("b.js\na.js\n", &mut remaining);

        assert_eq!(sorted, vec!["b.js", "a.js"]);
        assert_eq!(remaining, vec![".sorting", "c.js"]);
    }

    #[test]
    fn test_comments_blanks_and_unknown_entries() {
        let mut remaining = listing(&["a.js", "lib"]);
        let content = "# vendor code first\n\n  lib/  \nmissing.js\na.js\na.js\n";
        let sorted = parse_sort_file(content, &mut remaining);

        assert_eq!(sorted, vec!["lib", "a.js"]);
        assert!(remaining.is_empty());
    }
}
