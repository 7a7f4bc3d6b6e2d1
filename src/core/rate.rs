//! Duty rate parsing.
//!
//! Only ad-valorem rates are understood. Specific and compound rates
//! (per-kilogram amounts and the like) parse to zero, and the result is
//! marked as an approximation so callers can say so next to any figure
//! derived from it.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// No rate text at all.
    Unspecified,
    Free,
    AdValorem,
    /// A percentage plus a specific component; only the percentage is counted.
    CompoundAdValorem,
    /// Specific or otherwise unrecognised rate text, counted as zero.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutyRate {
    pub kind: RateKind,
    pub fraction: f64,
}

impl DutyRate {
    fn zero(kind: RateKind) -> Self {
        Self { kind, fraction: 0.0 }
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self.kind, RateKind::CompoundAdValorem | RateKind::Unsupported)
    }
}

fn percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent pattern is valid"))
}

fn specific_component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(¢|\d\s*c\s*/|\$|/\s*[a-z]|\beach\b|\bcents?\b)")
            .expect("specific component pattern is valid")
    })
}

pub fn parse_rate(rate: Option<&str>) -> DutyRate {
    let text = match rate.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return DutyRate::zero(RateKind::Unspecified),
    };

    if text.to_lowercase().contains("free") {
        return DutyRate::zero(RateKind::Free);
    }

    let Some(caps) = percent_regex().captures(text) else {
        return DutyRate::zero(RateKind::Unsupported);
    };

    let percent = match caps[1].parse::<f64>() {
        Ok(p) if p.is_finite() => p,
        _ => return DutyRate::zero(RateKind::Unsupported),
    };

    let kind = if specific_component_regex().is_match(text) {
        RateKind::CompoundAdValorem
    } else {
        RateKind::AdValorem
    };

    DutyRate {
        kind,
        fraction: percent / 100.0,
    }
}

pub fn rate_fraction(rate: Option<&str>) -> f64 {
    parse_rate(rate).fraction
}
