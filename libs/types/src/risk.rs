use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Risk band, derived purely from the numeric score: it is never set
/// independently of `risk_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// LOW <= 25, MEDIUM <= 50, HIGH <= 75, CRITICAL > 75.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=25 => RiskLevel::Low,
            26..=50 => RiskLevel::Medium,
            51..=75 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of scoring a protocol, position, or portfolio-concentration risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub factors: HashMap<String, Decimal>,
    pub recommendation: String,
}

impl RiskAssessment {
    /// Clamps `score` to 0..=100 and derives `risk_level` from it — the two
    /// can never disagree because this is the only constructor.
    pub fn new(score: i64, factors: HashMap<String, Decimal>, recommendation: impl Into<String>) -> Self {
        let clamped = score.clamp(0, 100) as u8;
        Self {
            risk_score: clamped,
            risk_level: RiskLevel::from_score(clamped),
            factors,
            recommendation: recommendation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(26), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(51), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(75), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(76), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn constructor_clamps_score() {
        let a = RiskAssessment::new(150, HashMap::new(), "x");
        assert_eq!(a.risk_score, 100);
        assert_eq!(a.risk_level, RiskLevel::Critical);
        let b = RiskAssessment::new(-10, HashMap::new(), "x");
        assert_eq!(b.risk_score, 0);
        assert_eq!(b.risk_level, RiskLevel::Low);
    }
}
