use super::base::*;
use crate::config::ShockScenario;
use crate::data::ReturnTable;
use crate::engines::evaluation::StrategyParams;
use crate::engines::generation::optimisation::{ValidationMethod, WalkForwardMethod};
use crate::engines::metrics::RiskMetrics;
use crate::error::{EvoAlphaError, Result};
use serde_json::json;

impl ShockScenario {
    /// Shocked copy of `table`. Drift adds a constant per-bar return, a
    /// crash hits every asset once at the middle bar, a volatility shock
    /// scales each asset's deviations from its own mean.
    pub fn apply(&self, table: &ReturnTable) -> ReturnTable {
        match *self {
            ShockScenario::Drift { per_bar } => table.map_returns(|_, _, r| r + per_bar),
            ShockScenario::Crash { magnitude } => {
                let crash_row = table.rows() / 2;
                table.map_returns(|_, row, r| if row == crash_row { r + magnitude } else { r })
            }
            ShockScenario::VolatilityScale { factor } => {
                let means: Vec<f64> = (0..table.n_assets())
                    .map(|a| RiskMetrics::mean(table.asset_returns(a)))
                    .collect();
                table.map_returns(|asset, _, r| means[asset] + factor * (r - means[asset]))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            ShockScenario::Drift { per_bar } => format!("drift({per_bar})"),
            ShockScenario::Crash { magnitude } => format!("crash({magnitude})"),
            ShockScenario::VolatilityScale { factor } => format!("vol_scale({factor})"),
        }
    }
}

/// Worst-case retained fraction of the unshocked Sharpe ratio across a fixed
/// set of synthetic shocks, clamped to `[floor, 1]`.
pub struct RegimeShockTest {
    shocks: Vec<ShockScenario>,
    floor: f64,
}

impl RegimeShockTest {
    pub fn new(shocks: Vec<ShockScenario>, floor: f64) -> Self {
        Self { shocks, floor }
    }

    /// Robustness score, or `None` when the table is too short to evaluate.
    pub fn robustness(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        method: &WalkForwardMethod,
    ) -> Option<f64> {
        let base = method.validate(params, table);
        if !base.has_data() {
            return None;
        }
        Some(self.retained(params, table, method, base.summary.sharpe).0)
    }

    fn retained(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        method: &WalkForwardMethod,
        base_sharpe: f64,
    ) -> (f64, Vec<(String, f64)>) {
        let shocked: Vec<(String, f64)> = self
            .shocks
            .iter()
            .map(|shock| {
                let result = method.validate(params, &shock.apply(table));
                (shock.label(), result.summary.sharpe)
            })
            .collect();

        if base_sharpe <= 0.0 || !base_sharpe.is_finite() {
            return (self.floor, shocked);
        }
        let worst = shocked
            .iter()
            .map(|(_, sharpe)| sharpe / base_sharpe)
            .fold(1.0_f64, f64::min);
        let score = if worst.is_finite() { worst } else { self.floor };
        (score.clamp(self.floor, 1.0), shocked)
    }
}

impl RobustnessTest for RegimeShockTest {
    fn name(&self) -> &str {
        "Regime Shock Test"
    }

    fn description(&self) -> &str {
        "Re-runs the strategy on drift, crash and volatility-scaled copies of the data"
    }

    fn run(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        method: &WalkForwardMethod,
    ) -> Result<TestResult> {
        let base = method.validate(params, table);
        if !base.has_data() {
            return Err(EvoAlphaError::InsufficientData {
                required: method.min_rows(),
                actual: table.rows(),
            });
        }
        let base_sharpe = base.summary.sharpe;
        let (score, shocked) = self.retained(params, table, method, base_sharpe);
        let passed = score > self.floor;

        let interpretation = if passed {
            format!("Strategy keeps {:.0}% of its Sharpe ratio under the worst shock", score * 100.0)
        } else {
            format!(
                "WARNING: Strategy collapses under shocks (score at floor {:.2})",
                self.floor
            )
        };

        Ok(TestResult {
            test_name: self.name().to_string(),
            passed,
            score,
            details: json!({
                "base_sharpe": base_sharpe,
                "shocked_sharpe": shocked
                    .iter()
                    .map(|(label, sharpe)| json!({ "shock": label, "sharpe": sharpe }))
                    .collect::<Vec<_>>(),
                "floor": self.floor,
            }),
            interpretation,
        })
    }
}
