// Risk result summary shown on the Results view.
//
// Until a real inference endpoint is configured these are fixed placeholder values; nothing here
// is computed from the submitted assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// `high` above 70, `moderate` above 40, otherwise `low`.
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            RiskLevel::High
        } else if score > 40 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFactor {
    pub factor: String,
    pub value: String,
    /// "High" | "Moderate" | "Low"
    pub impact: String,
    /// "increasing" | "stable" | "decreasing"
    pub trend: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualStatus {
    Normal,
    Attention,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintResidual {
    pub constraint: String,
    pub residual: f64,
    pub status: ResidualStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub version: String,
    pub training_dataset: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// 0-100
    pub risk_score: u8,
    /// 0.0-1.0
    pub pcos_probability: f64,
    /// 0.0-1.0
    pub metabolic_syndrome_probability: f64,
    pub key_factors: Vec<KeyFactor>,
    pub constraint_residuals: Vec<ConstraintResidual>,
    pub model: ModelInfo,
    pub generated_at: DateTime<Utc>,
}

pub const RECOMMENDATIONS: [(&str, &str); 3] = [
    (
        "Schedule Clinical Follow-up",
        "Consult with an endocrinologist or PCOS specialist for comprehensive evaluation and treatment planning.",
    ),
    (
        "Metabolic Panel Monitoring",
        "Regular monitoring of insulin resistance markers (HOMA-IR), lipid profile, and glucose tolerance recommended.",
    ),
    (
        "Lifestyle Modifications",
        "Evidence supports structured diet, exercise, and stress management for metabolic health improvement.",
    ),
];

fn factor(factor: &str, value: &str, impact: &str, trend: &str) -> KeyFactor {
    KeyFactor {
        factor: factor.to_string(),
        value: value.to_string(),
        impact: impact.to_string(),
        trend: trend.to_string(),
    }
}

fn residual(constraint: &str, residual: f64, status: ResidualStatus) -> ConstraintResidual {
    ConstraintResidual {
        constraint: constraint.to_string(),
        residual,
        status,
    }
}

impl ModelInfo {
    pub fn placeholder() -> Self {
        Self {
            version: "GAN-PINN v2.1.0".to_string(),
            training_dataset: "Public + Synthetic (n=12,453)".to_string(),
            last_updated: "2025-10-15".to_string(),
        }
    }
}

impl ResultSummary {
    /// Fixed placeholder result returned by the mock submission backend.
    pub fn mock() -> Self {
        Self {
            risk_score: 68,
            pcos_probability: 0.72,
            metabolic_syndrome_probability: 0.58,
            key_factors: vec![
                factor("HOMA-IR Index", "4.2", "High", "increasing"),
                factor("LH/FSH Ratio", "2.8", "Moderate", "stable"),
                factor("Testosterone Level", "68 ng/dL", "Moderate", "increasing"),
                factor("BMI", "28.5", "Moderate", "stable"),
            ],
            constraint_residuals: vec![
                residual("Insulin-Glucose Dynamics", 0.12, ResidualStatus::Normal),
                residual("Hormonal Balance", 0.34, ResidualStatus::Attention),
                residual("Metabolic Conservation", 0.08, ResidualStatus::Normal),
            ],
            model: ModelInfo::placeholder(),
            generated_at: Utc::now(),
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }

    pub fn consultation_recommended(&self) -> bool {
        self.risk_level() == RiskLevel::High
    }

    /// Range checks for a summary that came over the wire: score 0-100, probabilities 0.0-1.0.
    pub fn check_ranges(&self) -> Result<(), String> {
        if self.risk_score > 100 {
            return Err(format!("riskScore {} is outside 0-100", self.risk_score));
        }
        for (name, p) in [
            ("pcosProbability", self.pcos_probability),
            ("metabolicSyndromeProbability", self.metabolic_syndrome_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} {} is outside 0.0-1.0", name, p));
            }
        }
        Ok(())
    }

    /// Percent with one decimal, e.g. `0.72` -> `"72.0%"`.
    pub fn percent(p: f64) -> String {
        format!("{:.1}%", p * 100.0)
    }
}
