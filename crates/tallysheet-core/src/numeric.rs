//! Lenient number parsing shared by the evaluator, sort, auto-sum and the
//! selection aggregator.

use regex::Regex;
use std::sync::OnceLock;

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.\-]+").expect("punctuation regex must compile"))
}

fn float_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
            .expect("float prefix regex must compile")
    })
}

/// Parse the longest leading float, ignoring leading whitespace.
///
/// `"12abc"` is 12, `"1.5.2"` is 1.5, `"abc"` is `None`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    float_prefix_re()
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse().ok())
}

/// Strip currency/formatting punctuation (anything but digits, `.` and `-`)
pub fn strip_formatting(s: &str) -> String {
    punctuation_re().replace_all(s, "").into_owned()
}

/// Number behind a formatted display value such as `"$1,200.50"`
pub fn coerce_number(s: &str) -> Option<f64> {
    if s.trim().is_empty() {
        return None;
    }
    parse_float_prefix(&strip_formatting(s))
}

/// Render a number the way cells display it: integers without decimals
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
