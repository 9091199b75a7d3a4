use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::error::{ExploreError, ExploreResult};
use crate::models::Selector;

/// Describes one selector dimension: its name, the "no filter" token and the
/// accepted integer codes.
#[derive(Debug, Clone)]
pub struct SelectorSpec {
    pub kind: &'static str,
    pub sentinel: &'static str,
    pub range: RangeInclusive<u32>,
}

pub const MONTHS: SelectorSpec = SelectorSpec {
    kind: "month",
    sentinel: "0",
    range: 1..=6,
};

pub const DAYS: SelectorSpec = SelectorSpec {
    kind: "day of week",
    sentinel: "0",
    range: 1..=7,
};

/// A validated selector plus the bookkeeping needed to echo the user's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub selector: Selector,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Tokens given alongside the sentinel; reported, never applied.
    pub ignored: Vec<String>,
}

impl SelectorSpec {
    pub fn expected(&self) -> String {
        format!(
            "{} for all, or {}-{}",
            self.sentinel,
            self.range.start(),
            self.range.end()
        )
    }
}

fn tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

pub fn parse_bounded_selector(raw: &str, spec: &SelectorSpec) -> ExploreResult<Validated> {
    let tokens = tokens(raw);
    let sentinel = spec.sentinel.to_lowercase();

    if tokens.iter().any(|token| *token == sentinel) {
        let ignored = tokens
            .into_iter()
            .filter(|token| *token != sentinel)
            .collect();
        return Ok(Validated {
            selector: Selector::All,
            accepted: vec![sentinel],
            rejected: Vec::new(),
            ignored,
        });
    }

    let mut values = BTreeSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for token in tokens {
        match token.parse::<u32>() {
            Ok(value) if spec.range.contains(&value) => {
                if values.insert(value) {
                    accepted.push(token);
                }
            }
            _ => rejected.push(token),
        }
    }

    if values.is_empty() {
        return Err(ExploreError::InvalidSelector {
            kind: spec.kind,
            raw: raw.to_string(),
            expected: spec.expected(),
        });
    }

    Ok(Validated {
        selector: Selector::Values(values),
        accepted,
        rejected,
        ignored: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(validated: &Validated) -> Vec<u32> {
        match &validated.selector {
            Selector::All => Vec::new(),
            Selector::Values(values) => values.iter().copied().collect(),
        }
    }

    #[test]
    fn duplicates_and_out_of_range_months_are_dropped() {
        let validated = parse_bounded_selector("1,1,2,13", &MONTHS).unwrap();
        assert_eq!(values(&validated), vec![1, 2]);
        assert_eq!(validated.accepted, vec!["1", "2"]);
        assert_eq!(validated.rejected, vec!["13"]);
    }

    #[test]
    fn sentinel_overrides_other_tokens() {
        let validated = parse_bounded_selector("0,3", &DAYS).unwrap();
        assert_eq!(validated.selector, Selector::All);
        assert_eq!(validated.ignored, vec!["3"]);

        for raw in ["0", "5, 0", "x 0 99", "0,0,0"] {
            let validated = parse_bounded_selector(raw, &MONTHS).unwrap();
            assert_eq!(validated.selector, Selector::All, "input {raw:?}");
        }
    }

    #[test]
    fn no_valid_tokens_is_invalid() {
        for raw in ["", "  ", "13", "7,8", "abc", "-1", ",,;"] {
            let err = parse_bounded_selector(raw, &MONTHS).unwrap_err();
            assert!(
                matches!(err, ExploreError::InvalidSelector { kind: "month", .. }),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn malformed_tokens_are_dropped_when_others_survive() {
        let validated = parse_bounded_selector("mon, 2 ;x 7", &DAYS).unwrap();
        assert_eq!(values(&validated), vec![2, 7]);
        assert_eq!(validated.rejected, vec!["mon", "x"]);
    }

    #[test]
    fn values_are_sorted_ascending() {
        let validated = parse_bounded_selector("6 3 1", &MONTHS).unwrap();
        assert_eq!(values(&validated), vec![1, 3, 6]);
    }

    #[test]
    fn concatenated_digits_are_one_token() {
        // "12" is the number twelve, not months one and two.
        assert!(parse_bounded_selector("12", &MONTHS).is_err());
        let validated = parse_bounded_selector("012", &DAYS);
        assert!(validated.is_err());
    }
}
