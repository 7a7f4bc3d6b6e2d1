use crate::core::rate::{parse_rate, DutyRate};
use crate::domain::model::Candidate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Merchandise Processing Fee, as a fraction of the declared price.
pub const MPF_RATE: f64 = 0.003464;
/// Harbor Maintenance Fee, as a fraction of the declared price.
pub const HMF_RATE: f64 = 0.00125;
pub const DEFAULT_PRICE: f64 = 1000.0;
/// Largest declared price accepted; larger input is clamped to it.
pub const MAX_PRICE: f64 = 1e15;
/// Largest duty fraction accepted (100000%); larger rates are clamped to it.
pub const MAX_RATE_FRACTION: f64 = 1000.0;

pub const DISCLAIMER: &str = "*Basic estimation. Specific duties may apply.";

/// Currency label shown next to the price. No conversion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Eur => write!(f, "EUR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub duty_cost: f64,
    pub mpf_cost: f64,
    pub hmf_cost: f64,
    pub total_cost: f64,
}

/// Non-finite and negative values become 0; the rest is capped at `max`.
fn clamp_input(value: f64, max: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.min(max)
    } else {
        0.0
    }
}

/// Price as typed into a form: anything that is not a number counts as 0.
pub fn parse_price(input: &str) -> f64 {
    clamp_input(input.trim().parse::<f64>().unwrap_or(0.0), MAX_PRICE)
}

/// Every output is finite: price and rate are capped at
/// [`MAX_PRICE`] and [`MAX_RATE_FRACTION`] before multiplying.
pub fn estimate(rate_fraction: f64, price: f64) -> CostBreakdown {
    let price = clamp_input(price, MAX_PRICE);
    let rate_fraction = clamp_input(rate_fraction, MAX_RATE_FRACTION);

    let duty_cost = price * rate_fraction;
    let mpf_cost = price * MPF_RATE;
    let hmf_cost = price * HMF_RATE;

    CostBreakdown {
        duty_cost,
        mpf_cost,
        hmf_cost,
        total_cost: duty_cost + mpf_cost + hmf_cost,
    }
}

/// Cost estimate for one selected candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutyEstimate {
    pub code: String,
    pub description: String,
    pub rate_text: Option<String>,
    pub rate: DutyRate,
    pub price: f64,
    pub currency: Currency,
    pub costs: CostBreakdown,
}

impl DutyEstimate {
    pub fn for_candidate(candidate: &Candidate, price: f64, currency: Currency) -> Self {
        let rate = parse_rate(candidate.duty_rate.as_deref());
        let price = clamp_input(price, MAX_PRICE);
        let costs = estimate(rate.fraction, price);
        Self {
            code: candidate.code.clone(),
            description: candidate.description.clone(),
            rate_text: candidate.duty_rate.clone(),
            rate,
            price,
            currency,
            costs,
        }
    }

    pub fn is_approximate(&self) -> bool {
        self.rate.is_approximate()
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency.symbol(), amount)
    }
}
