//! Maps predicted traffic categories to operator-facing severity tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity for a predicted category. Matching is case-insensitive;
    /// categories outside the known set read as Medium, not as an error.
    pub fn of_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" => Severity::Low,
            "probe" => Severity::Medium,
            "dos" | "r2l" | "u2r" => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }

    /// Numeric rank for chart and sort consumers: Low 1, Medium 2, High 3.
    pub fn code(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
