//! Text rendering utilities for human-friendly error messages.
//!
//! Helpers to shorten Rust type names and to find identifiers that look
//! like the one a caller asked for.

/// Shortens a fully qualified type name for display.
///
/// ```
/// use wirebox_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::providers::DatabaseProvider");
/// assert_eq!(short, "DatabaseProvider");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next(); // consume second ':'
                segment.clear(); // discard path prefix
            }
            '<' | '>' | ',' | ' ' => {
                // Keep the segment so far, then the delimiter itself
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Renders identifiers as a comma separated, parenthesised list.
///
/// ```
/// use wirebox_support::rendering::render_list;
///
/// assert_eq!(render_list(&["logger", "mailer"]), "(logger), (mailer)");
/// ```
pub fn render_list(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|item| format!("({})", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Suggests identifiers close to `requested` among `available`.
///
/// Candidates are scored by substring containment first, then by
/// edit distance relative to the longer of the two names. At most
/// `max_suggestions` names are returned, best first.
///
/// ```
/// use wirebox_support::rendering::suggest_similar;
///
/// let known = ["mailer", "logger", "database"];
/// assert_eq!(suggest_similar("maler", known, 2), vec!["mailer".to_string()]);
/// ```
pub fn suggest_similar<'a>(
    requested: &str,
    available: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .into_iter()
        .filter_map(|name| {
            let name_lower = name.to_lowercase();
            if name_lower == requested_lower || name_lower.is_empty() {
                return None;
            }

            // Substring hits outrank any typo match
            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            let distance = edit_distance(&requested_lower, &name_lower);
            let longest = requested_lower.chars().count().max(name_lower.chars().count());
            let similarity = (longest - distance.min(longest)) * 100 / longest;

            // At least 60% of characters match
            (similarity >= 60).then_some((name, similarity))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_simple_path() {
        assert_eq!(
            shorten_type_name("my_app::providers::MailProvider"),
            "MailProvider"
        );
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn render_empty_list() {
        let items: Vec<&str> = vec![];
        assert_eq!(render_list(&items), "");
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn suggest_typo() {
        let available = ["user.service", "user.repository", "logger", "database"];
        let suggestions = suggest_similar("user.servise", available, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("user.service"));
    }

    #[test]
    fn suggest_substring_ranks_first() {
        let available = ["cache.redis", "cachex"];
        let suggestions = suggest_similar("cache", available, 3);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn suggest_no_match() {
        let suggestions = suggest_similar("xyzabcdef", ["database"], 3);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn suggest_skips_exact_match() {
        let suggestions = suggest_similar("logger", ["logger", "loggers"], 3);
        assert_eq!(suggestions, vec!["loggers".to_string()]);
    }
}
