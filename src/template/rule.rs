//! Key rules: the `|...` suffix on a shape key (`"tags|1-3"`, `"price|10-99.2"`, `"seq|+1"`).

use rand::{Rng, RngCore};
use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on any single repeat or length: key rules and directive arguments alike.
pub const MAX_REPEAT: i64 = 10_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRule {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub dmin: Option<u32>,
    pub dmax: Option<u32>,
    pub step: Option<i64>,
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:([+-]?\d+)(?:-([+-]?\d+))?)?(?:\.(\d+)(?:-(\d+))?)?$").expect("static regex")
    })
}

impl KeyRule {
    /// Parse the text after `|`. Returns None when it is not a recognized rule.
    pub fn parse(raw: &str) -> Option<KeyRule> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(step) = raw.strip_prefix('+') {
            return step.parse().ok().map(|step| KeyRule {
                step: Some(step),
                ..KeyRule::default()
            });
        }
        let caps = range_re().captures(raw)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok());
        let dec = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let rule = KeyRule {
            min: num(1),
            max: num(2),
            dmin: dec(3),
            dmax: dec(4),
            step: None,
        };
        if rule.min.is_none() && rule.dmin.is_none() {
            return None;
        }
        Some(rule)
    }

    /// Repeat/pick count: random within `min..=max`, or `min` alone.
    pub fn count(&self, rng: &mut dyn RngCore) -> i64 {
        match (self.min, self.max) {
            (Some(a), Some(b)) => rng.random_range(a.min(b)..=a.max(b)),
            (Some(a), None) => a,
            _ => 1,
        }
    }

    /// Number of decimal places for a `.dmin-dmax` rule.
    pub fn decimals(&self, rng: &mut dyn RngCore) -> Option<u32> {
        match (self.dmin, self.dmax) {
            (Some(a), Some(b)) => Some(rng.random_range(a.min(b)..=a.max(b))),
            (Some(a), None) => Some(a),
            _ => None,
        }
    }
}

/// Split a shape key into its field name and optional rule. Keys whose suffix is not a
/// valid rule are kept whole.
pub fn split_key(key: &str) -> (&str, Option<KeyRule>) {
    match key.split_once('|') {
        Some((name, raw)) if !name.is_empty() => match KeyRule::parse(raw) {
            Some(rule) => (name, Some(rule)),
            None => (key, None),
        },
        _ => (key, None),
    }
}
