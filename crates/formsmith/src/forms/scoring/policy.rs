use serde::{Deserialize, Serialize};

/// Round half up (toward positive infinity), the rounding every displayed score uses.
pub fn round_half_up(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to a fixed number of decimal places using `round_half_up`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor
}

/// Stored score precision: two decimal places.
pub fn round_score(score: f64) -> f64 {
    round_to(score, 2)
}

/// Whole-number percentage of `score` over `max_score`, 0 when nothing is at stake.
pub fn percentage(score: f64, max_score: f64) -> u32 {
    if max_score > 0.0 {
        let pct = round_half_up((score / max_score) * 100.0);
        pct.clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Headline bucket shown alongside a respondent's percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    Excellent,
    Good,
    KeepPracticing,
}

impl PerformanceBand {
    pub fn for_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            Self::Excellent
        } else if percentage >= 60 {
            Self::Good
        } else {
            Self::KeepPracticing
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent!",
            Self::Good => "Good job!",
            Self::KeepPracticing => "Keep practicing!",
        }
    }
}
