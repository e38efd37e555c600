//! Identifier helpers shared across the pipeline.

use std::collections::HashMap;

/// Cleans a name for importation into databases: lowercase, special
/// characters folded (`*` -> `t`/`-s`, `+` -> `p`), everything outside
/// `[A-Za-z0-9_#]` collapsed to single dashes, no leading/trailing dashes.
/// `#` survives because replicate labels use it.
pub fn clean_name(name: &str) -> String {
    let mut s = name.replace('\\', " ");
    s = s.trim().to_lowercase();

    if s.ends_with('*') {
        s.pop();
        s.push_str("-s");
    }
    s = s.replace('*', "t").replace('+', "p");

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '#' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Makes names unique by appending `_1`, `_2`, ... to later duplicates,
/// preserving order and first occurrences.
pub fn make_unique(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    names
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{}_{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_special_characters() {
        assert_eq!(clean_name("ddd.aaa"), "ddd-aaa");
        assert_eq!(clean_name("ddd uuu"), "ddd-uuu");
        assert_eq!(clean_name("ddd+aaa"), "dddpaaa");
        assert_eq!(clean_name("ddd*yyy"), "dddtyyy");
        assert_eq!(clean_name("ddd#dd"), "ddd#dd");
        assert_eq!(clean_name("rep*"), "rep-s");
    }

    #[test]
    fn test_clean_name_collapses_and_trims_dashes() {
        assert_eq!(clean_name("  A   b..c  "), "a-b-c");
        assert_eq!(clean_name("-lead-trail-"), "lead-trail");
    }

    #[test]
    fn test_make_unique_suffixes_duplicates() {
        let names: Vec<String> = ["qc01", "s1", "qc01", "qc01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(make_unique(&names), vec!["qc01", "s1", "qc01_1", "qc01_2"]);
    }
}
