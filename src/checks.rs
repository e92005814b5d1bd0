// src/checks.rs
use regex::Regex;

use crate::models::{CheckResult, ItemResult};

/// Counts passing and failing checks across the whole tree.
///
/// A leaf counts its own verdict. A combinator counts its own verdict AND
/// every child's, recursively, so composite checks weigh as many verdicts as
/// were actually evaluated. Counting is purely structural: it never looks at
/// the check type, so new check kinds need no change here.
pub fn count_checks(check: &CheckResult) -> (u32, u32) {
    let (mut passed, mut failed) = if check.passed { (1, 0) } else { (0, 1) };

    if let Some(children) = &check.children {
        for child in children {
            let (p, f) = count_checks(child);
            passed += p;
            failed += f;
        }
    }

    (passed, failed)
}

/// Whole-tree tallies for one item, summed over its top-level checks.
pub fn count_item(item: &ItemResult) -> (u32, u32) {
    item.checks.iter().fold((0, 0), |(passed, failed), check| {
        let (p, f) = count_checks(check);
        (passed + p, failed + f)
    })
}

const DETAIL_MAX_CHARS: usize = 80;

/// One-line detail for a check, keyed on its type tag and message text.
///
/// Presentation only: extraction failures of any kind fall back to the raw
/// message, truncated. Has no bearing on aggregation.
pub fn detail(check: &CheckResult) -> String {
    let message = check.message.as_str();

    let extracted = match check.check_type.as_str() {
        "pattern" => extract_quoted(message).map(|snippet| {
            if check.passed {
                format!("matched \"{}\"", snippet)
            } else {
                format!("no match for \"{}\"", snippet)
            }
        }),
        "similarity" => extract_percentage(message).map(|pct| format!("similarity {}%", pct)),
        "token_limit" => extract_number(message).map(|n| format!("{} tokens", n)),
        "judge" => first_sentence(message),
        _ => None,
    };

    extracted.unwrap_or_else(|| truncate(message, DETAIL_MAX_CHARS))
}

fn extract_quoted(message: &str) -> Option<String> {
    let re = Regex::new(r#""([^"]+)""#).unwrap();
    re.captures(message).map(|caps| caps[1].to_string())
}

fn extract_percentage(message: &str) -> Option<String> {
    let re = Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap();
    re.captures(message).map(|caps| caps[1].to_string())
}

fn extract_number(message: &str) -> Option<String> {
    let re = Regex::new(r"\d+").unwrap();
    re.find(message).map(|m| m.as_str().to_string())
}

fn first_sentence(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find('.') {
        Some(idx) => Some(trimmed[..=idx].to_string()),
        None => Some(truncate(trimmed, DETAIL_MAX_CHARS)),
    }
}

/// Char-safe truncation; appends "..." when anything was cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
