//! String helpers used to assemble prompts and post-process completions.

use std::collections::{HashMap, HashSet};
use regex::{Captures, Regex};
use lazy_static::lazy_static;

use crate::utils::string::errors::MalformedBooleanString;

lazy_static! {
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{\[.*?\]\}").unwrap();
}

#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    //! Strips "{\[" and "\]}" from a matched placeholder.
    //! Only call this on text matched by [PLACEHOLDER_MATCH_RE].
    &key[2..key.len() - 2]
}

/// Collect the names of all `{[name]}` placeholders in a string.
pub fn get_placeholders(string: &str) -> HashSet<String> {
    PLACEHOLDER_MATCH_RE.captures_iter(string)
        .map(|captures| strip_format(&captures[0]).to_string())
        .collect()
}

/// Replace every placeholder that has a mapping. Placeholders without a mapping are kept verbatim.
pub(crate) fn replace_placeholders(original: &str, mapping: &HashMap<String, String>) -> String {
    PLACEHOLDER_MATCH_RE.replace_all(original, |captures: &Captures| {
        let match_text = &captures[0];
        mapping.get(strip_format(match_text))
            .cloned()
            .unwrap_or_else(|| match_text.to_string())
    }).into_owned()
}

/// Parse `"true"` or `"false"`, ignoring surrounding whitespace and case.
///
/// # Example
/// ```
/// use chipprompt::utils::string::parse_bool_string;
/// assert_eq!(parse_bool_string("  True ").unwrap(), true);
/// assert!(parse_bool_string("no").is_err());
/// ```
pub fn parse_bool_string(string_value: &str) -> Result<bool, MalformedBooleanString> {
    match string_value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(MalformedBooleanString { raw: string_value.to_string() }),
    }
}

/// Count the lines that start with `0.` once leading whitespace is removed.
pub fn count_lines_starting_with_zero_dot(input: &str) -> usize {
    input.split('\n')
        .filter(|line| line.trim().starts_with("0."))
        .count()
}

/// Join sentences so that each one is separated by exactly one period.
///
/// Entries made only of spaces and dots are skipped.
pub fn join_strings_with_dots<S: AsRef<str>>(strings: &[S]) -> String {
    let mut result = String::new();
    let mut joined = 0;
    for string in strings.iter().map(AsRef::as_ref) {
        if string.trim_start_matches([' ', '.']).is_empty() {
            continue;
        }
        if joined > 0 {
            if result.ends_with('.') {
                result.push(' ');
            } else {
                result.push_str(". ");
            }
        }
        result.push_str(string);
        joined += 1;
    }
    result
}

/// Join sentences with a period and a space, trimming trailing spaces, dots and newlines from every
/// sentence but the first.
pub fn join_strings_with_period<S: AsRef<str>>(strings: &[S]) -> String {
    let Some((first, rest)) = strings.split_first() else {
        return String::new();
    };
    let mut result = first.as_ref().to_string();
    for s in rest {
        if !result.ends_with('.') {
            result.push('.');
        }
        result.push(' ');
        result.push_str(s.as_ref().trim_end_matches([' ', '.', '\n']));
    }
    result
}

/// Byte index of the `n`-th (1-based) occurrence of `substring` in `string`. Occurrences may overlap.
///
/// Returns `None` for `n == 0` or when there are fewer than `n` occurrences.
///
/// # Example
/// ```
/// use chipprompt::utils::string::find_nth_occurrence;
/// assert_eq!(find_nth_occurrence("ab", "ab-ab-ab", 2), Some(3));
/// assert_eq!(find_nth_occurrence("aa", "aaa", 2), Some(1));
/// assert_eq!(find_nth_occurrence("ab", "ab", 2), None);
/// ```
pub fn find_nth_occurrence(substring: &str, string: &str, n: usize) -> Option<usize> {
    let mut found: Option<usize> = None;
    for _ in 0..n {
        let start = match found {
            None => 0,
            Some(prev) => prev + string[prev..].chars().next().map_or(1, char::len_utf8),
        };
        if start > string.len() {
            return None;
        }
        found = Some(start + string[start..].find(substring)?);
    }
    found
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when a string is neither `"true"` nor `"false"` after trimming and case folding.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MalformedBooleanString {
        pub raw: String,
    }

    impl fmt::Display for MalformedBooleanString {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "Invalid boolean string: {:?}", self.raw)
        }
    }

    impl Error for MalformedBooleanString {}
}

#[cfg(test)]
mod string_tests {
    use std::collections::{HashMap, HashSet};
    use super::*;

    #[test]
    fn test_get_keys() {
        let keys = get_placeholders("{[a]}");
        assert_eq!(HashSet::from(["a".to_string()]), keys);

        let keys = get_placeholders("{[a\n]}");
        assert_eq!(0, keys.len());

        let keys = get_placeholders("{[record]}    {[questions]}");
        assert_eq!(HashSet::from(["record".to_string(), "questions".to_string()]), keys);
    }

    #[test]
    fn test_replace_keeps_unmapped() {
        let mapping = HashMap::from([("a".to_string(), "alice".to_string())]);
        assert_eq!("alice and {[b]} and alice", replace_placeholders("{[a]} and {[b]} and {[a]}", &mapping));
    }

    #[test]
    fn test_parse_bool_string() {
        assert_eq!(Ok(true), parse_bool_string("  True "));
        assert_eq!(Ok(false), parse_bool_string("FALSE\n"));
        let err = parse_bool_string("no").unwrap_err();
        assert_eq!("no", err.raw);
        assert!(err.to_string().contains("no"));
        assert!(parse_bool_string("").is_err());
    }

    #[test]
    fn test_count_zero_dot_lines() {
        let text = "0.1 first\n  0.25 second\n1.0 third\n\n0 fourth\n\t0.\n";
        assert_eq!(3, count_lines_starting_with_zero_dot(text));
        assert_eq!(0, count_lines_starting_with_zero_dot(""));
    }

    #[test]
    fn test_join_with_dots() {
        assert_eq!("A. B. C", join_strings_with_dots(&["A", "B.", "C"]));
        assert_eq!("A. C", join_strings_with_dots(&["A", " . ", "", "C"]));
        assert_eq!("", join_strings_with_dots::<&str>(&[]));
        assert_eq!("..x", join_strings_with_dots(&["..x"]));
    }

    #[test]
    fn test_join_with_period() {
        assert_eq!("", join_strings_with_period::<String>(&[]));
        assert_eq!("first", join_strings_with_period(&["first"]));
        assert_eq!("First. Second. Third", join_strings_with_period(&["First", "Second. \n", "Third..."]));
        assert_eq!("Done. Next", join_strings_with_period(&["Done.", "Next"]));
    }

    #[test]
    fn test_find_nth_occurrence() {
        assert_eq!(None, find_nth_occurrence("a", "banana", 0));
        assert_eq!(Some(1), find_nth_occurrence("a", "banana", 1));
        assert_eq!(Some(5), find_nth_occurrence("a", "banana", 3));
        assert_eq!(None, find_nth_occurrence("a", "banana", 4));
        assert_eq!(Some(3), find_nth_occurrence("ana", "banana", 2));
        assert_eq!(Some(4), find_nth_occurrence("µ", "aµbµ", 2));
    }
}
