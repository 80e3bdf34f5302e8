//! Slug and display-name derivation for stories
//!
//! Pure, deterministic helpers: the indexer relies on the same module
//! producing the same ids on every run, so nothing in here may consult
//! ambient state.

use regex::Regex;

/// An `includeStories` / `excludeStories` filter: either an explicit list
/// of export names or a compiled pattern.
#[derive(Debug, Clone)]
pub enum IncludeExcludeList {
    Names(Vec<String>),
    Pattern(Regex),
}

impl IncludeExcludeList {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Names(names) => names.iter().any(|n| n == name),
            Self::Pattern(pattern) => pattern.is_match(name),
        }
    }
}

// Characters collapsed into `-` when slugifying, including the typographic
// quotes and dashes that show up in copy-pasted titles.
const SLUG_PUNCTUATION: &[char] = &[
    ' ', '\u{2019}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2032}', '\u{00bf}', '\'', '`', '~',
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '_', '|', '+', '-', '=', '?', ';', ':', '"',
    ',', '.', '<', '>', '{', '}', '[', ']', '\\', '/',
];

/// Lowercase and collapse punctuation runs into single dashes.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;
    for ch in input.to_lowercase().chars() {
        if SLUG_PUNCTUATION.contains(&ch) {
            if !last_dash {
                out.push('-');
                last_dash = true;
            }
        } else {
            out.push(ch);
            last_dash = false;
        }
    }
    out.trim_matches('-').to_string()
}

/// Derive a story id from a meta id-or-title and a story display name.
pub fn to_id(title: &str, name: &str) -> String {
    format!("{}--{}", sanitize(title), sanitize(name))
}

/// Humanize an export name into a display name: `someStory` becomes
/// `Some Story`, `__page` becomes `Page`.
pub fn story_name_from_export(key: &str) -> String {
    start_case(key)
}

/// Whether a named export is a story, given the meta's include/exclude
/// filters. The interop marker `__esModule`, the order marker
/// `__namedExportsOrder` and the `default` export are never stories.
pub fn is_export_story(
    key: &str,
    include: Option<&IncludeExcludeList>,
    exclude: Option<&IncludeExcludeList>,
) -> bool {
    if key == "default" || key == "__esModule" || key == "__namedExportsOrder" {
        return false;
    }
    if let Some(include) = include
        && !include.matches(key)
    {
        return false;
    }
    if let Some(exclude) = exclude
        && exclude.matches(key)
    {
        return false;
    }
    true
}

// Word-splitting start case: breaks on non-alphanumerics, camelCase
// humps, acronym tails (FOOBar -> FOO Bar) and letter/digit boundaries,
// then uppercases the first letter of each word.
fn start_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            flush(&mut words, &mut current);
            continue;
        }
        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && ch.is_uppercase())
                || (prev.is_uppercase() && ch.is_uppercase() && next_lower)
                || (prev.is_alphabetic() && ch.is_numeric())
                || (prev.is_numeric() && ch.is_alphabetic());
            if boundary {
                flush(&mut words, &mut current);
            }
        }
        current.push(ch);
    }
    flush(&mut words, &mut current);

    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut word_chars = word.chars();
        if let Some(first) = word_chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(word_chars.as_str());
        }
    }
    out
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_punctuation() {
        assert_eq!(sanitize("Foo/Bar Baz"), "foo-bar-baz");
        assert_eq!(sanitize("  Leading & trailing!  "), "leading-trailing");
        assert_eq!(sanitize("Already-clean"), "already-clean");
    }

    #[test]
    fn to_id_joins_title_and_name() {
        assert_eq!(to_id("Example/Button", "Primary Story"), "example-button--primary-story");
    }

    #[test]
    fn story_names_are_humanized() {
        assert_eq!(story_name_from_export("someStory"), "Some Story");
        assert_eq!(story_name_from_export("__page"), "Page");
        assert_eq!(story_name_from_export("WithURL"), "With URL");
        assert_eq!(story_name_from_export("story1"), "Story 1");
        assert_eq!(story_name_from_export("A"), "A");
    }

    #[test]
    fn markers_are_never_stories() {
        assert!(!is_export_story("__esModule", None, None));
        assert!(!is_export_story("__namedExportsOrder", None, None));
        assert!(!is_export_story("default", None, None));
        assert!(is_export_story("Primary", None, None));
    }

    #[test]
    fn include_exclude_filters_apply() {
        let include = IncludeExcludeList::Names(vec!["A".into()]);
        assert!(is_export_story("A", Some(&include), None));
        assert!(!is_export_story("B", Some(&include), None));

        let exclude = IncludeExcludeList::Pattern(Regex::new("^Internal").unwrap());
        assert!(!is_export_story("InternalOnly", None, Some(&exclude)));
        assert!(is_export_story("Public", None, Some(&exclude)));
    }
}
