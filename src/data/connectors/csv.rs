use super::{
    types::{DatasetMetadata, DATE_ALIASES, VOLUME_SUFFIX},
    validator::DataValidator,
};
use crate::data::provider::MarketDataProvider;
use crate::data::table::ReturnTable;
use crate::error::{EvoAlphaError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| EvoAlphaError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Convert a wide price frame into period-over-period returns.
    ///
    /// Date-like columns become labels, `<asset>_volume` columns become
    /// volumes, and every other numeric column is an asset price. The first
    /// row is consumed by the differencing. A return whose previous price is
    /// missing or non-positive is recorded as 0.0 and counted as invalid.
    pub fn returns_from_prices(df: &DataFrame) -> Result<(ReturnTable, usize)> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let date_column = names.iter().find(|n| DATE_ALIASES.contains(&n.as_str())).cloned();
        let mut price_columns = Vec::new();
        for name in &names {
            if Some(name) == date_column.as_ref() || name.ends_with(VOLUME_SUFFIX) {
                continue;
            }
            if DataValidator::is_numeric(df.column(name)?.dtype()) {
                price_columns.push(name.clone());
            } else {
                log::warn!("Ignoring non-numeric column '{}'", name);
            }
        }
        DataValidator::validate_price_frame(df, &price_columns)?;

        let mut invalid = 0usize;
        let mut returns = Vec::with_capacity(price_columns.len());
        for name in &price_columns {
            let prices = Self::float_column(df, name)?;
            let column: Vec<f64> = prices
                .windows(2)
                .map(|w| match (w[0], w[1]) {
                    (Some(prev), Some(cur)) if prev > 0.0 => cur / prev - 1.0,
                    _ => {
                        invalid += 1;
                        0.0
                    }
                })
                .collect();
            returns.push(column);
        }

        let mut table = ReturnTable::new(price_columns.clone(), returns)?;

        if let Some(date) = &date_column {
            let labels = df.column(date)?.cast(&DataType::String)?;
            let labels: Vec<String> = labels
                .str()?
                .into_iter()
                .skip(1)
                .map(|v| v.unwrap_or("").to_string())
                .collect();
            table = table.with_labels(labels)?;
        }

        let volume_names: Vec<String> = price_columns
            .iter()
            .map(|p| format!("{}{}", p, VOLUME_SUFFIX))
            .collect();
        if volume_names.iter().all(|v| names.contains(v)) {
            let mut volumes = Vec::with_capacity(volume_names.len());
            for name in &volume_names {
                let column = Self::float_column(df, name)?;
                volumes.push(column.into_iter().skip(1).map(|v| v.unwrap_or(0.0)).collect());
            }
            table = table.with_volumes(volumes)?;
        }

        Ok((table, invalid))
    }

    fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df.column(name)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().collect())
    }
}

/// Price file loaded once and served from memory.
pub struct CsvMarketData {
    table: ReturnTable,
    metadata: DatasetMetadata,
}

impl CsvMarketData {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let df = CsvConnector::load(&path)?;
        let (table, invalid_returns) = CsvConnector::returns_from_prices(&df)?;
        if invalid_returns > 0 {
            log::warn!(
                "{} returns in {} could not be computed and were set to 0.0",
                invalid_returns,
                path.display()
            );
        }
        let table = DataValidator::sanitize(table);

        let metadata = DatasetMetadata {
            file_path: path.to_string_lossy().to_string(),
            num_rows: table.rows(),
            assets: table.assets().to_vec(),
            has_volume: table.has_volumes(),
            period: table.period(),
            invalid_returns,
        };
        log::info!(
            "Loaded {} return rows for {} assets from {}",
            metadata.num_rows,
            metadata.assets.len(),
            metadata.file_path
        );

        Ok(Self { table, metadata })
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
}

impl MarketDataProvider for CsvMarketData {
    fn get_returns(&self, period: usize) -> Result<ReturnTable> {
        if self.table.is_empty() {
            return Err(EvoAlphaError::DataUnavailable(format!(
                "{} produced no returns",
                self.metadata.file_path
            )));
        }
        Ok(self.table.tail(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_prices_with_dates_and_volumes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,SPY,QQQ,SPY_volume,QQQ_volume").unwrap();
        writeln!(file, "2024-01-02,100.0,200.0,1000,2000").unwrap();
        writeln!(file, "2024-01-03,101.0,198.0,1100,2100").unwrap();
        writeln!(file, "2024-01-04,99.99,201.96,1200,2200").unwrap();
        file.flush().unwrap();

        let data = CsvMarketData::load(file.path()).unwrap();
        let table = data.get_returns(0).unwrap();

        assert_eq!(table.assets(), &["SPY".to_string(), "QQQ".to_string()]);
        assert_eq!(table.rows(), 2);
        assert!((table.asset_returns(0)[0] - 0.01).abs() < 1e-12);
        assert!((table.asset_returns(1)[0] + 0.01).abs() < 1e-12);
        assert_eq!(table.asset_volumes(0), Some(&[1100.0, 1200.0][..]));
        assert_eq!(data.metadata().period.as_deref(), Some("2024-01-03_to_2024-01-04"));
    }

    #[test]
    fn test_file_without_prices_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,comment").unwrap();
        writeln!(file, "2024-01-02,hello").unwrap();
        file.flush().unwrap();

        assert!(CsvMarketData::load(file.path()).is_err());
    }
}
