//! Dollar-cost averaging projection.
//!
//! Contributions are compounded in annual steps: each year's twelve monthly
//! contributions are added to the running value before that year's growth is
//! applied once. This is an approximation of monthly compounding and the
//! figures shown by the simulator depend on it.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Growth scenarios offered by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthScenario {
    Conservative,
    Moderate,
    Aggressive,
}

impl GrowthScenario {
    pub fn annual_rate(&self) -> f64 {
        match self {
            GrowthScenario::Conservative => 0.10,
            GrowthScenario::Moderate => 0.30,
            GrowthScenario::Aggressive => 0.60,
        }
    }
}

impl Display for GrowthScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GrowthScenario::Conservative => "Conservative",
            GrowthScenario::Moderate => "Moderate",
            GrowthScenario::Aggressive => "Aggressive",
        };
        write!(f, "{} ({:.0}%)", name, self.annual_rate() * 100.0)
    }
}

impl FromStr for GrowthScenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" | "10" => Ok(GrowthScenario::Conservative),
            "moderate" | "30" => Ok(GrowthScenario::Moderate),
            "aggressive" | "60" => Ok(GrowthScenario::Aggressive),
            _ => Err(anyhow::anyhow!("Invalid growth scenario: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    pub monthly_contribution: f64,
    pub horizon_years: u32,
    pub annual_growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: u32,
    pub cumulative_invested: f64,
    pub projected_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProjectionSummary {
    pub total_invested: f64,
    pub final_value: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub points: Vec<YearPoint>,
    pub summary: ProjectionSummary,
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Projects the value of a fixed monthly contribution over `horizon_years`.
///
/// Invalid numbers never reach the output: a negative or non-finite
/// contribution or rate is treated as zero and the rate is capped at 100%.
pub fn project(input: &ProjectionInput) -> Projection {
    let monthly = non_negative(input.monthly_contribution);
    let rate = non_negative(input.annual_growth_rate).min(1.0);
    let annual_contribution = monthly * MONTHS_PER_YEAR;

    let mut points = Vec::with_capacity(input.horizon_years as usize);
    let mut invested = 0.0;
    let mut value = 0.0;

    for year in 1..=input.horizon_years {
        invested += annual_contribution;
        value = (value + annual_contribution) * (1.0 + rate);
        points.push(YearPoint {
            year,
            cumulative_invested: invested,
            projected_value: value.round(),
        });
    }

    let summary = points
        .last()
        .map(|last| ProjectionSummary {
            total_invested: last.cumulative_invested,
            final_value: last.projected_value,
            profit: last.projected_value - last.cumulative_invested,
        })
        .unwrap_or_default();

    Projection { points, summary }
}
