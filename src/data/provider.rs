use super::table::ReturnTable;
use crate::error::Result;

/// Train ratio used when none is configured: 0.7 for long histories, else 0.6.
pub fn dynamic_train_ratio(rows: usize) -> f64 {
    if rows > 1000 {
        0.7
    } else {
        0.6
    }
}

/// Source of market returns for an evolutionary run.
///
/// Implementations either return a table (possibly empty) or signal
/// `EvoAlphaError::DataUnavailable`; the engine turns both into zero-valued
/// evaluations instead of failing.
pub trait MarketDataProvider: Send + Sync {
    /// Most recent `period` rows; `period == 0` returns everything.
    fn get_returns(&self, period: usize) -> Result<ReturnTable>;

    fn get_train_test_split(
        &self,
        ratio: Option<f64>,
        period: usize,
    ) -> Result<(ReturnTable, ReturnTable)> {
        let table = self.get_returns(period)?;
        let ratio = ratio.unwrap_or_else(|| dynamic_train_ratio(table.rows()));
        Ok(table.split_at_ratio(ratio))
    }
}

/// Fixed in-memory table.
#[derive(Debug, Clone)]
pub struct StaticMarketData {
    table: ReturnTable,
}

impl StaticMarketData {
    pub fn new(table: ReturnTable) -> Self {
        Self { table }
    }
}

impl MarketDataProvider for StaticMarketData {
    fn get_returns(&self, period: usize) -> Result<ReturnTable> {
        Ok(self.table.tail(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_ratio() {
        assert_eq!(dynamic_train_ratio(1500), 0.7);
        assert_eq!(dynamic_train_ratio(1000), 0.6);
    }

    #[test]
    fn test_static_split_uses_period_then_ratio() {
        let table = ReturnTable::new(vec!["A".to_string()], vec![(0..100).map(|i| i as f64).collect()])
            .unwrap();
        let provider = StaticMarketData::new(table);
        let (is, oos) = provider.get_train_test_split(Some(0.75), 40).unwrap();
        assert_eq!(is.rows(), 30);
        assert_eq!(oos.rows(), 10);
        assert_eq!(is.asset_returns(0)[0], 60.0);
    }
}
