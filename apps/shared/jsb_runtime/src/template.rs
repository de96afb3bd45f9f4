//! Positional argument substitution for script files
//!
//! Script files may contain `%1`, `%2`, ... placeholders that are replaced by
//! the caller's arguments before evaluation. Substitution runs from the highest
//! index present down to the lowest so that `%10` is never clobbered by an
//! earlier `%1` pass. Arguments are inserted verbatim, without any escaping.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{BridgeError, Result};

/// Distinct `%N` indices that appear in `template`, highest first
fn placeholder_indices(template: &str) -> Vec<usize> {
    let bytes = template.as_bytes();
    let mut indices = BTreeSet::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            // Out-of-range indices cannot name an argument anyway
            if let Ok(index) = template[start..end].parse::<usize>() {
                if index > 0 {
                    indices.insert(index);
                }
            }
            i = end.max(start);
        } else {
            i += 1;
        }
    }

    indices.into_iter().rev().collect()
}

/// Substitute positional placeholders in `template`
///
/// Every `%N` is replaced with `args[N - 1]`, or with the empty string when
/// the caller supplied fewer than `N` arguments. Only indices present in the
/// template are visited, highest first.
pub fn apply<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut script = template.to_string();

    for index in placeholder_indices(template) {
        let value = args.get(index - 1).map(|arg| arg.as_ref()).unwrap_or("");
        script = script.replace(&format!("%{}", index), value);
    }

    script
}

/// Read a script file in full and substitute its placeholders
///
/// # Errors
/// Returns [`BridgeError::Load`] when the file cannot be read as UTF-8 text
pub fn load_script<S: AsRef<str>>(path: &Path, args: &[S]) -> Result<String> {
    let template = fs::read_to_string(path).map_err(|source| BridgeError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Script file loaded: {} ({} bytes, {} arguments)", path.display(), template.len(), args.len());

    Ok(apply(&template, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn numbered(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("a{}", i)).collect()
    }

    #[test]
    fn test_single_argument() {
        assert_eq!(apply("print(%1)", &["hello"]), "print(hello)");
    }

    #[test]
    fn test_reordered_arguments() {
        assert_eq!(apply("f(%2,%1)", &["a", "b"]), "f(b,a)");
    }

    #[test]
    fn test_two_digit_index_is_not_corrupted() {
        let args = numbered(10);
        assert_eq!(apply("%10-%1", &args), "a10-a1");
    }

    #[test]
    fn test_two_digit_placeholder_without_argument() {
        // %12 has no argument; %1 must not eat its prefix
        assert_eq!(apply("%12|%1", &["x"]), "|x");
    }

    #[test]
    fn test_missing_argument_becomes_empty() {
        assert_eq!(apply("[%1][%3]", &["x"]), "[x][]");
    }

    #[test]
    fn test_no_placeholders() {
        let args: [&str; 0] = [];
        assert_eq!(apply("1 + 1 % 2", &args), "1 + 1 % 2");
    }

    #[test]
    fn test_values_are_not_escaped() {
        assert_eq!(apply("s = '%1'", &["it's"]), "s = 'it's'");
    }

    #[test]
    fn test_placeholder_indices() {
        assert_eq!(placeholder_indices("%3 %12 % %3 %0"), vec![12, 3]);
        assert!(placeholder_indices("100%").is_empty());
    }

    #[test]
    fn test_large_numbers_after_percent_are_cheap() {
        let started = std::time::Instant::now();
        assert_eq!(apply("n%1000000007", &["x"]), "n");
        assert_eq!(apply("a %18446744073709551615 %99999999999999999999999", &["x"]), "a  %99999999999999999999999");
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_load_script_templates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "print(%1)").unwrap();

        let script = load_script(file.path(), &["hello"]).unwrap();
        assert_eq!(script, "print(hello)");
    }

    #[test]
    fn test_load_script_missing_file() {
        let result = load_script(Path::new("/nonexistent/jsb/script.js"), &["x"]);
        assert!(matches!(result, Err(BridgeError::Load { .. })));
    }
}
