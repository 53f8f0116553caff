use super::ui;
use crate::core::config::SimulatorConfig;
use crate::core::projection::{self, GrowthScenario, Projection, ProjectionInput};
use anyhow::Result;
use comfy_table::Cell;
use tracing::debug;

const MIN_CONTRIBUTION: f64 = 10.0;
const MAX_CONTRIBUTION: f64 = 1000.0;
const CONTRIBUTION_STEP: f64 = 10.0;
const MIN_YEARS: u32 = 1;
const MAX_YEARS: u32 = 20;

/// Simulator parameters from the command line; unset values come from config.
#[derive(Debug, Clone, Default)]
pub struct SimulateArgs {
    pub monthly: Option<f64>,
    pub years: Option<u32>,
    pub scenario: Option<GrowthScenario>,
}

/// Snaps a contribution to the simulator's 10..=1000 range in steps of 10.
pub fn clamp_contribution(monthly: f64) -> f64 {
    if !monthly.is_finite() {
        return MIN_CONTRIBUTION;
    }
    let stepped = (monthly / CONTRIBUTION_STEP).round() * CONTRIBUTION_STEP;
    stepped.clamp(MIN_CONTRIBUTION, MAX_CONTRIBUTION)
}

pub fn resolve_input(
    args: &SimulateArgs,
    defaults: &SimulatorConfig,
) -> (ProjectionInput, GrowthScenario) {
    let scenario = args.scenario.unwrap_or(defaults.scenario);
    let input = ProjectionInput {
        monthly_contribution: clamp_contribution(
            args.monthly.unwrap_or(defaults.monthly_contribution),
        ),
        horizon_years: args
            .years
            .unwrap_or(defaults.horizon_years)
            .clamp(MIN_YEARS, MAX_YEARS),
        annual_growth_rate: scenario.annual_rate(),
    };
    (input, scenario)
}

pub fn render_projection(
    input: &ProjectionInput,
    scenario: GrowthScenario,
    projection: &Projection,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Year"),
        ui::header_cell("Invested"),
        ui::header_cell("Projected Value"),
    ]);
    for point in &projection.points {
        table.add_row(vec![
            Cell::new(format!("Year {}", point.year)),
            ui::usd_cell(point.cumulative_invested),
            ui::usd_cell(point.projected_value),
        ]);
    }

    let summary = &projection.summary;
    let mut output = format!(
        "{}\n{} per month for {} years, {} scenario\n\n",
        ui::style_text("DCA Simulator", ui::StyleType::Title),
        ui::format_usd(input.monthly_contribution),
        input.horizon_years,
        scenario
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{} {}\n{} {}\n{} {}",
        ui::style_text("Total Invested:", ui::StyleType::TotalLabel),
        ui::format_usd(summary.total_invested),
        ui::style_text("Estimated Value:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(summary.final_value), ui::StyleType::TotalValue),
        ui::style_text("Total Profit:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("+{}", ui::format_usd(summary.profit)),
            ui::StyleType::TotalValue
        ),
    ));
    output
}

pub fn run(args: &SimulateArgs, defaults: &SimulatorConfig) -> Result<()> {
    let (input, scenario) = resolve_input(args, defaults);
    debug!(?input, ?scenario, "Running projection");

    let projection = projection::project(&input);
    println!("{}", render_projection(&input, scenario, &projection));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_contribution() {
        assert_eq!(clamp_contribution(0.0), 10.0);
        assert_eq!(clamp_contribution(-50.0), 10.0);
        assert_eq!(clamp_contribution(104.0), 100.0);
        assert_eq!(clamp_contribution(106.0), 110.0);
        assert_eq!(clamp_contribution(5000.0), 1000.0);
        assert_eq!(clamp_contribution(f64::NAN), 10.0);
    }

    #[test]
    fn test_resolve_input_uses_defaults() {
        let (input, scenario) =
            resolve_input(&SimulateArgs::default(), &SimulatorConfig::default());

        assert_eq!(input.monthly_contribution, 100.0);
        assert_eq!(input.horizon_years, 5);
        assert_eq!(input.annual_growth_rate, 0.30);
        assert_eq!(scenario, GrowthScenario::Moderate);
    }

    #[test]
    fn test_resolve_input_clamps_args() {
        let args = SimulateArgs {
            monthly: Some(2500.0),
            years: Some(0),
            scenario: Some(GrowthScenario::Aggressive),
        };
        let (input, _) = resolve_input(&args, &SimulatorConfig::default());

        assert_eq!(input.monthly_contribution, 1000.0);
        assert_eq!(input.horizon_years, 1);
        assert_eq!(input.annual_growth_rate, 0.60);

        let args = SimulateArgs {
            years: Some(45),
            ..SimulateArgs::default()
        };
        assert_eq!(resolve_input(&args, &SimulatorConfig::default()).0.horizon_years, 20);
    }

    #[test]
    fn test_render_projection_summary() {
        let (input, scenario) = resolve_input(
            &SimulateArgs {
                monthly: Some(100.0),
                years: Some(1),
                scenario: Some(GrowthScenario::Moderate),
            },
            &SimulatorConfig::default(),
        );
        let projection = projection::project(&input);
        let output = render_projection(&input, scenario, &projection);

        assert!(output.contains("Year 1"));
        assert!(output.contains("$1,200"));
        assert!(output.contains("$1,560"));
        assert!(output.contains("+$360"));
    }
}
