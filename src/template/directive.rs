//! Directive resolution: `@placeholder` tokens inside leaf strings.
//!
//! A string that is exactly one placeholder resolves to a typed value (`"@integer(1,9)"` is a
//! number). Placeholders embedded in longer text are substituted as strings. Unknown
//! placeholders are left as written.

use crate::error::GenerationError;
use crate::template::data::*;
use crate::template::rule::MAX_REPEAT;
use chrono::{DateTime, Local, Utc};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

/// Resolves leaf values of a template into generated values.
pub trait DirectiveResolver: Send + Sync {
    fn resolve(&self, directive: &str, rng: &mut dyn RngCore) -> Result<Value, GenerationError>;
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)(?:\(([^()]*)\))?").expect("static regex"))
}

/// Built-in resolver with the usual mock placeholders (names, text, numbers, dates, web).
#[derive(Debug, Default)]
pub struct MockResolver {
    increment: AtomicI64,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectiveResolver for MockResolver {
    fn resolve(&self, directive: &str, rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
        let re = placeholder_re();
        if let Some(caps) = re.captures(directive) {
            if let Some(whole) = caps.get(0) {
                if whole.start() == 0 && whole.end() == directive.len() {
                    let name = &caps[1];
                    let args = parse_args(caps.get(2).map(|m| m.as_str()));
                    return Ok(self
                        .placeholder(name, &args, rng)
                        .map_err(|reason| invalid(directive, reason))?
                        .unwrap_or_else(|| Value::String(directive.to_string())));
                }
            }
        } else {
            return Ok(Value::String(directive.to_string()));
        }

        let mut out = String::with_capacity(directive.len());
        let mut last = 0;
        for caps in re.captures_iter(directive) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&directive[last..whole.start()]);
            let args = parse_args(caps.get(2).map(|m| m.as_str()));
            match self.placeholder(&caps[1], &args, rng).map_err(|reason| invalid(directive, reason))? {
                Some(Value::String(s)) => out.push_str(&s),
                Some(other) => out.push_str(&other.to_string()),
                None => out.push_str(whole.as_str()),
            }
            if out.len() > MAX_TEXT {
                return Err(GenerationError::TooLarge(MAX_TEXT));
            }
            last = whole.end();
        }
        out.push_str(&directive[last..]);
        Ok(Value::String(out))
    }
}

fn invalid(directive: &str, reason: String) -> GenerationError {
    GenerationError::InvalidDirective {
        directive: directive.to_string(),
        reason,
    }
}

fn parse_args(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => raw
            .split(',')
            .map(|a| a.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .collect(),
    }
}

fn int_arg(args: &[String], i: usize, default: i64) -> Result<i64, String> {
    match args.get(i).filter(|a| !a.is_empty()) {
        None => Ok(default),
        Some(a) => a.parse().map_err(|_| format!("argument {} must be an integer, got '{}'", i + 1, a)),
    }
}

/// Longest string one interpolated directive may produce.
pub const MAX_TEXT: usize = 4 * 1024 * 1024;

/// Lengths and counts requested by directive arguments.
fn clamp_len(n: i64) -> i64 {
    n.clamp(0, MAX_REPEAT)
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn pick<'a>(pool: &'a [&'a str], rng: &mut dyn RngCore) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn letters(len: usize, pool: &str, rng: &mut dyn RngCore) -> String {
    let pool: Vec<char> = pool.chars().collect();
    (0..len).filter_map(|_| pool.choose(rng).copied()).collect()
}

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()[]";

fn char_pool(name: &str) -> String {
    match name {
        "lower" => LOWER.into(),
        "upper" => UPPER.into(),
        "number" => DIGITS.into(),
        "symbol" => SYMBOLS.into(),
        "alpha" => format!("{}{}", LOWER, UPPER),
        custom => custom.into(),
    }
}

/// Translate `yyyy-MM-dd HH:mm:ss` style patterns to chrono's strftime.
fn chrono_format(pattern: &str) -> String {
    pattern
        .replace('%', "%%")
        .replace("yyyy", "%Y")
        .replace("yy", "%y")
        .replace("MM", "%m")
        .replace("dd", "%d")
        .replace("HH", "%H")
        .replace("mm", "%M")
        .replace("ss", "%S")
}

fn random_datetime(rng: &mut dyn RngCore) -> DateTime<Utc> {
    let now = Utc::now().timestamp();
    let secs = rng.random_range(0..=now.max(1));
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

fn random_float(min: i64, max: i64, dmin: i64, dmax: i64, rng: &mut dyn RngCore) -> Value {
    let (min, max) = ordered(min, max);
    let (dmin, dmax) = ordered(dmin.clamp(0, 15), dmax.clamp(0, 15));
    let int_part = rng.random_range(min..=max);
    let places = rng.random_range(dmin..=dmax) as usize;
    float_value(int_part, places, rng)
}

/// `int_part.ddd` with `places` random digits, the last one non-zero.
pub(crate) fn float_value(int_part: i64, places: usize, rng: &mut dyn RngCore) -> Value {
    if places == 0 {
        return Value::Number(int_part.into());
    }
    let mut digits = letters(places - 1, DIGITS, rng);
    digits.push(char::from(b'0' + rng.random_range(1..=9u8)));
    let text = format!("{}.{}", int_part, digits);
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Number(int_part.into()))
}

impl MockResolver {
    /// Resolve one placeholder. `Ok(None)` means the name is not known.
    fn placeholder(&self, name: &str, args: &[String], rng: &mut dyn RngCore) -> Result<Option<Value>, String> {
        let s = |v: String| -> Result<Option<Value>, String> { Ok(Some(Value::String(v))) };
        match name.to_ascii_lowercase().as_str() {
            "guid" | "uuid" => s(uuid::Uuid::new_v4().to_string()),
            "id" => {
                let mut id = char::from(b'0' + rng.random_range(1..=9u8)).to_string();
                id.push_str(&letters(17, DIGITS, rng));
                s(id)
            }
            "increment" => {
                let step = int_arg(args, 0, 1)?;
                let next = self.increment.fetch_add(step, Ordering::Relaxed).wrapping_add(step);
                Ok(Some(Value::Number(next.into())))
            }
            "boolean" | "bool" => Ok(Some(Value::Bool(rng.random_bool(0.5)))),
            "natural" => {
                let (min, max) = ordered(int_arg(args, 0, 0)?.max(0), int_arg(args, 1, i32::MAX as i64)?.max(0));
                Ok(Some(Value::Number(rng.random_range(min..=max).into())))
            }
            "integer" | "int" => {
                let (min, max) = ordered(int_arg(args, 0, i32::MIN as i64)?, int_arg(args, 1, i32::MAX as i64)?);
                Ok(Some(Value::Number(rng.random_range(min..=max).into())))
            }
            "float" => {
                let min = int_arg(args, 0, i16::MIN as i64)?;
                let max = int_arg(args, 1, i16::MAX as i64)?;
                let dmin = int_arg(args, 2, 0)?;
                let dmax = int_arg(args, 3, 4)?;
                Ok(Some(random_float(min, max, dmin, dmax, rng)))
            }
            "character" | "char" => {
                let pool = args.first().map(|p| char_pool(p)).unwrap_or_else(|| format!("{}{}{}{}", LOWER, UPPER, DIGITS, SYMBOLS));
                s(letters(1, &pool, rng))
            }
            "string" | "str" => {
                let (pool, rest) = match args.first() {
                    Some(a) if a.parse::<i64>().is_err() && !a.is_empty() => (char_pool(a), &args[1..]),
                    _ => (format!("{}{}", LOWER, UPPER), args),
                };
                let (min, max) = match rest.len() {
                    0 => (3, 7),
                    1 => {
                        let n = int_arg(rest, 0, 5)?;
                        (n, n)
                    }
                    _ => ordered(int_arg(rest, 0, 3)?, int_arg(rest, 1, 7)?),
                };
                let len = rng.random_range(clamp_len(min)..=clamp_len(max)) as usize;
                s(letters(len, &pool, rng))
            }
            "range" => {
                let (start, stop) = match args.len() {
                    0 => (0, 10),
                    1 => (0, int_arg(args, 0, 10)?),
                    _ => (int_arg(args, 0, 0)?, int_arg(args, 1, 10)?),
                };
                let step = int_arg(args, 2, 1)?;
                if step <= 0 {
                    return Err("step must be positive".into());
                }
                let values: Vec<Value> = (start..stop)
                    .step_by(usize::try_from(step).unwrap_or(usize::MAX))
                    .take(MAX_REPEAT as usize)
                    .map(|n| Value::Number(n.into()))
                    .collect();
                Ok(Some(Value::Array(values)))
            }
            "pick" => {
                let choice = args.choose(rng).cloned().unwrap_or_default();
                Ok(Some(serde_json::from_str(&choice).unwrap_or(Value::String(choice))))
            }
            "word" => {
                let (min, max) = word_bounds(args, 3, 10)?;
                let len = rng.random_range(min..=max) as usize;
                s(letters(len, LOWER, rng))
            }
            "title" => {
                let (min, max) = word_bounds(args, 3, 7)?;
                let n = rng.random_range(min..=max);
                s((0..n).map(|_| capitalize(pick(LOREM, rng))).collect::<Vec<_>>().join(" "))
            }
            "sentence" => {
                let (min, max) = word_bounds(args, 12, 18)?;
                s(sentence(min, max, rng))
            }
            "paragraph" => {
                let (min, max) = word_bounds(args, 3, 7)?;
                let n = rng.random_range(min..=max);
                s((0..n).map(|_| sentence(12, 18, rng)).collect::<Vec<_>>().join(" "))
            }
            "first" => s(pick(FIRST_NAMES, rng).to_string()),
            "last" => s(pick(LAST_NAMES, rng).to_string()),
            "name" => s(format!("{} {}", pick(FIRST_NAMES, rng), pick(LAST_NAMES, rng))),
            "cfirst" => s(pick(CN_SURNAMES, rng).to_string()),
            "clast" => s(pick(CN_GIVEN, rng).to_string()),
            "cname" => s(format!("{}{}", pick(CN_SURNAMES, rng), pick(CN_GIVEN, rng))),
            "cword" => {
                let (min, max) = word_bounds(args, 1, 1)?;
                let len = rng.random_range(min..=max) as usize;
                s(letters(len, CN_CHARS, rng))
            }
            "ctitle" => {
                let (min, max) = word_bounds(args, 3, 7)?;
                let len = rng.random_range(min..=max) as usize;
                s(letters(len, CN_CHARS, rng))
            }
            "csentence" => {
                let (min, max) = word_bounds(args, 12, 18)?;
                s(csentence(min, max, rng))
            }
            "cparagraph" => {
                let (min, max) = word_bounds(args, 3, 7)?;
                let n = rng.random_range(min..=max);
                s((0..n).map(|_| csentence(12, 18, rng)).collect::<String>())
            }
            "domain" => s(domain(args.first().map(String::as_str), rng)),
            "email" => {
                let user = letters(rng.random_range(3..=8), LOWER, rng);
                s(format!("{}@{}", user, domain(args.first().map(String::as_str), rng)))
            }
            "url" => {
                let protocol = args.first().filter(|p| !p.is_empty()).cloned().unwrap_or_else(|| "http".into());
                let path = letters(rng.random_range(3..=8), LOWER, rng);
                s(format!("{}://{}/{}", protocol, domain(args.get(1).map(String::as_str), rng), path))
            }
            "ip" => {
                let octets: Vec<String> = (0..4).map(|_| rng.random_range(1..=254u8).to_string()).collect();
                s(octets.join("."))
            }
            "date" => s(random_datetime(rng).format(&format_arg(args, "yyyy-MM-dd")).to_string()),
            "time" => s(random_datetime(rng).format(&format_arg(args, "HH:mm:ss")).to_string()),
            "datetime" => s(random_datetime(rng).format(&format_arg(args, "yyyy-MM-dd HH:mm:ss")).to_string()),
            "now" => s(Local::now().format(&format_arg(args, "yyyy-MM-dd HH:mm:ss")).to_string()),
            "color" => s(format!("#{:06x}", rng.random_range(0..=0xFF_FFFFu32))),
            "province" => s(pick(PROVINCES, rng).to_string()),
            "city" => s(pick(CITIES, rng).to_string()),
            "zip" => s(letters(6, DIGITS, rng)),
            _ => Ok(None),
        }
    }
}

fn word_bounds(args: &[String], min: i64, max: i64) -> Result<(i64, i64), String> {
    match args.len() {
        0 => Ok((min, max)),
        1 => {
            let n = clamp_len(int_arg(args, 0, min)?);
            Ok((n, n))
        }
        _ => {
            let (a, b) = ordered(int_arg(args, 0, min)?, int_arg(args, 1, max)?);
            Ok((clamp_len(a), clamp_len(b)))
        }
    }
}

fn sentence(min: i64, max: i64, rng: &mut dyn RngCore) -> String {
    let n = rng.random_range(min..=max).max(1);
    let words: Vec<&str> = (0..n).map(|_| pick(LOREM, rng)).collect();
    format!("{}.", capitalize(&words.join(" ")))
}

fn csentence(min: i64, max: i64, rng: &mut dyn RngCore) -> String {
    let len = rng.random_range(min..=max).max(1) as usize;
    format!("{}。", letters(len, CN_CHARS, rng))
}

fn domain(tld: Option<&str>, rng: &mut dyn RngCore) -> String {
    let name = letters(rng.random_range(3..=8), LOWER, rng);
    let tld = tld.filter(|t| !t.is_empty()).map(str::to_string).unwrap_or_else(|| pick(TLDS, rng).to_string());
    format!("{}.{}", name, tld)
}

fn format_arg(args: &[String], default: &str) -> String {
    chrono_format(args.first().filter(|a| !a.is_empty()).map(String::as_str).unwrap_or(default))
}
