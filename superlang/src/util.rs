//! Shared utility functions
//!
//! "Did you mean" suggestions for unresolved variables and unknown
//! functions.

/// Levenshtein edit distance between two strings, two-row variant.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (m, n) = (a_chars.len(), b_chars.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Closest candidate within `threshold` edits. Ties keep the first
/// candidate; an exact match is never suggested.
pub fn find_similar_name<'a>(
    name: &str,
    candidates: &[&'a str],
    threshold: usize,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;

    for &candidate in candidates {
        if candidate == name {
            continue;
        }
        let distance = levenshtein_distance(name, candidate);
        if distance <= threshold && best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(candidate, _)| candidate)
}

/// Suffix appended to an "unknown name" message
pub fn format_suggestion_hint(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean `{name}`?)"),
        None => String::new(),
    }
}
