//! Declarative rule tables.
//!
//! A table is an ordered list of `pattern -> outcome` rules over folded text.
//! Lookups test rules in array order and the first rule that matches wins,
//! regardless of where in the text the match occurs.

use regex::{Captures, Regex};
use tracing::error;

#[derive(Debug)]
pub struct Rule<T> {
    /// Human-readable form of the pattern, used in reports
    pub label: String,
    pub regex: Regex,
    pub outcome: T,
}

#[derive(Debug)]
pub struct RuleTable<T> {
    pub name: &'static str,
    rules: Vec<Rule<T>>,
}

/// A rule that matched, with its captures
pub struct RuleMatch<'r, 't, T> {
    pub rule: &'r Rule<T>,
    pub captures: Captures<'t>,
}

impl<T: Copy> RuleTable<T> {
    /// Compile `(pattern, outcome)` pairs. Invalid patterns are logged and skipped;
    /// every table in this crate is covered by a test that checks nothing was skipped.
    pub fn new(name: &'static str, specs: &[(&str, T)]) -> Self {
        let rules = specs
            .iter()
            .filter_map(|(pattern, outcome)| match Regex::new(pattern) {
                Ok(regex) => Some(Rule {
                    label: pattern.replace(r"\b", ""),
                    regex,
                    outcome: *outcome,
                }),
                Err(e) => {
                    error!("Rule table {}: invalid pattern '{}': {}", name, pattern, e);
                    None
                }
            })
            .collect();
        Self { name, rules }
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn first_match<'r, 't>(&'r self, text: &'t str) -> Option<RuleMatch<'r, 't, T>> {
        self.rules.iter().find_map(|rule| {
            rule.regex
                .captures(text)
                .map(|captures| RuleMatch { rule, captures })
        })
    }

    pub fn outcome(&self, text: &str) -> Option<T> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(text))
            .map(|rule| rule.outcome)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.regex.is_match(text))
    }
}

/// A table whose only outcome is "matched"
pub type KeywordTable = RuleTable<()>;

pub fn keywords(name: &'static str, patterns: &[&str]) -> KeywordTable {
    let specs: Vec<(&str, ())> = patterns.iter().map(|p| (*p, ())).collect();
    RuleTable::new(name, &specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rule_in_array_order_wins() {
        let table = RuleTable::new("order", &[("beta", 2u8), ("alfa", 1u8)]);
        // "alfa" occurs first in the text, but "beta" is first in the table
        assert_eq!(table.outcome("alfa y beta"), Some(2));
        assert_eq!(table.outcome("solo alfa"), Some(1));
        assert_eq!(table.outcome("nada"), None);
    }

    #[test]
    fn test_labels_drop_word_boundaries() {
        let table = keywords("kw", &[r"\btes\b"]);
        let hit = table.first_match("llega un tes").unwrap();
        assert_eq!(hit.rule.label, "tes");
        assert!(!table.is_match("testigo presencial"));
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let table = keywords("broken", &["(unclosed", "ok"]);
        assert_eq!(table.len(), 1);
        assert!(table.is_match("ok"));
    }
}
