use crate::data::table::ReturnTable;
use crate::error::{EvoAlphaError, Result};
use polars::prelude::*;

pub struct DataValidator;

impl DataValidator {
    pub fn is_numeric(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float64
                | DataType::Float32
                | DataType::Int64
                | DataType::Int32
                | DataType::UInt64
                | DataType::UInt32
        )
    }

    /// Require at least one numeric price column.
    pub fn validate_price_frame(df: &DataFrame, price_columns: &[String]) -> Result<()> {
        if df.height() == 0 {
            return Err(EvoAlphaError::DataUnavailable("price file has no rows".to_string()));
        }
        if price_columns.is_empty() {
            return Err(EvoAlphaError::DataLoading(format!(
                "No numeric price columns found in {:?}",
                df.get_column_names()
            )));
        }
        Ok(())
    }

    pub fn validate_minimum_rows(rows: usize, min_rows: usize) -> Result<()> {
        if rows < min_rows {
            return Err(EvoAlphaError::InsufficientData {
                required: min_rows,
                actual: rows,
            });
        }
        Ok(())
    }

    /// Count non-finite returns across all assets.
    pub fn count_non_finite(table: &ReturnTable) -> usize {
        (0..table.n_assets())
            .map(|a| table.asset_returns(a).iter().filter(|r| !r.is_finite()).count())
            .sum()
    }

    /// Replace non-finite returns with zero, warning when any were found.
    pub fn sanitize(table: ReturnTable) -> ReturnTable {
        let bad = Self::count_non_finite(&table);
        if bad == 0 {
            return table;
        }
        log::warn!("Replacing {} non-finite returns with 0.0", bad);
        table.map_returns(|_, _, r| if r.is_finite() { r } else { 0.0 })
    }
}
