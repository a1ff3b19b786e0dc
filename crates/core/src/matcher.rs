//! Resolving the stated answer text to one of the options.
//!
//! Matching is tolerant: after whitespace collapsing and case folding an
//! exact match wins, otherwise the first option that contains the answer (or
//! is contained by it) is taken. When options overlap, for example one option
//! being a prefix of another, containment can pick the wrong one; that is a
//! known limitation and is left as is.

use serde::{Deserialize, Serialize};

/// How an answer was matched to an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Containment,
}

/// The option chosen for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMatch {
    pub index: usize,
    pub kind: MatchKind,
}

/// Collapses whitespace runs to one space and case-folds.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Finds the option matching `answer`.
///
/// Exact matches take priority over containment across the whole list; within
/// one rule the first option wins.
///
/// # Example
///
/// ```rust
/// use quizsift_core::matcher::{MatchKind, match_answer};
///
/// let options = ["Paris", "Rome", "Berlin"];
/// let m = match_answer(&options, Some("  rome ")).unwrap();
/// assert_eq!((m.index, m.kind), (1, MatchKind::Exact));
///
/// assert!(match_answer(&options, None).is_none());
/// ```
pub fn match_answer<S: AsRef<str>>(options: &[S], answer: Option<&str>) -> Option<AnswerMatch> {
    let answer = normalize(answer?);
    if answer.is_empty() {
        return None;
    }

    let normalized: Vec<String> = options.iter().map(|o| normalize(o.as_ref())).collect();

    if let Some(index) = normalized.iter().position(|opt| *opt == answer) {
        return Some(AnswerMatch { index, kind: MatchKind::Exact });
    }

    normalized
        .iter()
        .position(|opt| !opt.is_empty() && (answer.contains(opt.as_str()) || opt.contains(answer.as_str())))
        .map(|index| AnswerMatch { index, kind: MatchKind::Containment })
}

/// Index of the option matching `answer`, if any.
pub fn find_correct_option<S: AsRef<str>>(options: &[S], answer: Option<&str>) -> Option<usize> {
    match_answer(options, answer).map(|m| m.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  New \n  Delhi\t"), "new delhi");
        assert_eq!(normalize(""), "");
    }

    #[rstest]
    #[case(&["Paris", "Rome", "Berlin", "Madrid"], Some("Paris"), Some(0))]
    #[case(&["Paris", "Rome"], Some("ROME"), Some(1))]
    #[case(&["New   Delhi", "Mumbai"], Some("new delhi"), Some(0))]
    #[case(&["Pacific Ocean", "Atlantic Ocean"], Some("The Atlantic Ocean"), Some(1))]
    #[case(&["1945", "1939"], Some("19"), Some(0))]
    #[case(&["Paris", "Rome"], Some("London"), None)]
    #[case(&["Paris", "Rome"], None, None)]
    #[case(&["Paris", "Rome"], Some("   "), None)]
    fn test_find_correct_option(
        #[case] options: &[&str], #[case] answer: Option<&str>, #[case] expected: Option<usize>,
    ) {
        assert_eq!(find_correct_option(options, answer), expected);
    }

    #[test]
    fn test_exact_beats_earlier_containment() {
        let options = ["Rome, Italy", "Rome"];
        let m = match_answer(&options, Some("rome")).unwrap();

        assert_eq!(m.index, 1);
        assert_eq!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn test_containment_prefers_first_option() {
        let options = ["Java", "JavaScript"];
        let m = match_answer(&options, Some("JavaScript language")).unwrap();

        // Known limitation: "java" is contained in the answer and comes first.
        assert_eq!(m.index, 0);
        assert_eq!(m.kind, MatchKind::Containment);
    }

    #[test]
    fn test_empty_option_never_matches() {
        let options = ["", "Paris"];
        assert_eq!(find_correct_option(&options, Some("paris")), Some(1));
    }

    #[test]
    fn test_deterministic_across_calls() {
        let options = ["alpha beta", "beta", "alpha"];
        let first = match_answer(&options, Some("Alpha  Beta Gamma"));

        for _ in 0..50 {
            assert_eq!(match_answer(&options, Some("alpha beta gamma")), first);
        }
    }
}
