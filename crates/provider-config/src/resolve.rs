//! First-valid-wins resolution over an ordered candidate list.
//!
//! Every tiered field (temperature, max tokens, timeout, model, extended
//! parameters) is the same shape: consult keys in strict order, take the
//! first trimmed, non-empty value the field's parser accepts, otherwise keep
//! walking. One combinator instead of one hand-rolled chain per field.

use crate::source::SourceChain;

/// Outcome of a chain walk, carrying which key produced the value for
/// logging and troubleshooting hints.
pub(crate) struct Resolved<T> {
    pub value: T,
    pub source_key: String,
}

/// Walk `keys` in order; the first value that is present, non-empty after
/// trimming, and accepted by `parse` wins. Values present but rejected by
/// `parse` do not stop the walk.
pub(crate) fn first_valid<T>(
    chain: &SourceChain,
    keys: &[String],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<Resolved<T>> {
    for key in keys {
        let Some(raw) = chain.get_non_empty(key) else {
            continue;
        };
        match parse(&raw) {
            Some(value) => {
                return Some(Resolved {
                    value,
                    source_key: key.clone(),
                });
            }
            None => {
                log::debug!("ignoring invalid value in {key}; continuing down the chain");
            }
        }
    }
    None
}

/// Accept any non-empty string as-is.
pub(crate) fn parse_string(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

/// Floats accepted only within `[min, max]`.
pub(crate) fn parse_float_in_range(min: f64, max: f64) -> impl Fn(&str) -> Option<f64> {
    move |raw| {
        let value: f64 = raw.parse().ok()?;
        (min <= value && value <= max).then_some(value)
    }
}

/// Positive integers; fractional input is floored first.
pub(crate) fn parse_positive_int(raw: &str) -> Option<u64> {
    let value = if let Ok(int) = raw.parse::<u64>() {
        int
    } else {
        let float: f64 = raw.parse().ok()?;
        if !float.is_finite() || float < 0.0 {
            return None;
        }
        float.floor() as u64
    };
    (value > 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CallerEnv, FileEnv, SourceChain};
    use std::collections::BTreeMap;

    fn chain(pairs: &[(&str, &str)]) -> SourceChain {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SourceChain::without_process_env(CallerEnv::from_map(map), FileEnv::empty())
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn short_circuits_on_first_valid_value() {
        let chain = chain(&[("A", "0.9"), ("B", "0.5")]);
        let resolved = first_valid(&chain, &keys(&["A", "B"]), parse_float_in_range(0.0, 2.0))
            .expect("resolved");
        assert_eq!(resolved.value, 0.9);
        assert_eq!(resolved.source_key, "A");
    }

    #[test]
    fn invalid_value_continues_down_the_chain() {
        let chain = chain(&[("A", "9.5"), ("B", "0.5")]);
        let resolved = first_valid(&chain, &keys(&["A", "B"]), parse_float_in_range(0.0, 2.0))
            .expect("resolved");
        assert_eq!(resolved.value, 0.5);
        assert_eq!(resolved.source_key, "B");
    }

    #[test]
    fn empty_and_whitespace_values_are_skipped() {
        let chain = chain(&[("A", "  "), ("B", "value")]);
        let resolved = first_valid(&chain, &keys(&["A", "B"]), parse_string).expect("resolved");
        assert_eq!(resolved.value, "value");
    }

    #[test]
    fn exhausted_chain_yields_none() {
        let chain = chain(&[]);
        assert!(first_valid(&chain, &keys(&["A", "B"]), parse_string).is_none());
    }

    #[test]
    fn positive_int_floors_fractions_and_rejects_nonpositive() {
        assert_eq!(parse_positive_int("4096"), Some(4096));
        assert_eq!(parse_positive_int("4096.9"), Some(4096));
        assert_eq!(parse_positive_int("0"), None);
        assert_eq!(parse_positive_int("0.4"), None);
        assert_eq!(parse_positive_int("-5"), None);
        assert_eq!(parse_positive_int("lots"), None);
    }

    #[test]
    fn float_range_is_inclusive() {
        let parse = parse_float_in_range(0.0, 2.0);
        assert_eq!(parse("0"), Some(0.0));
        assert_eq!(parse("2"), Some(2.0));
        assert_eq!(parse("2.01"), None);
        assert_eq!(parse("-0.1"), None);
    }
}
