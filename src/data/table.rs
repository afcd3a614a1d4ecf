use crate::error::{EvoAlphaError, Result};
use serde::{Deserialize, Serialize};

/// Time-indexed per-asset fractional returns.
///
/// Stored column-major (`returns[asset][row]`) so that per-asset rolling
/// statistics walk contiguous memory. Period labels and volumes are optional;
/// when present they have exactly `rows()` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    assets: Vec<String>,
    labels: Vec<String>,
    returns: Vec<Vec<f64>>,
    volumes: Option<Vec<Vec<f64>>>,
}

impl ReturnTable {
    pub fn new(assets: Vec<String>, returns: Vec<Vec<f64>>) -> Result<Self> {
        if assets.len() != returns.len() {
            return Err(EvoAlphaError::DataLoading(format!(
                "{} asset names for {} return columns",
                assets.len(),
                returns.len()
            )));
        }
        let rows = returns.first().map(Vec::len).unwrap_or(0);
        if returns.iter().any(|column| column.len() != rows) {
            return Err(EvoAlphaError::DataLoading(
                "Return columns have different lengths".to_string(),
            ));
        }
        Ok(Self {
            assets,
            labels: Vec::new(),
            returns,
            volumes: None,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if !labels.is_empty() && labels.len() != self.rows() {
            return Err(EvoAlphaError::DataLoading(format!(
                "{} period labels for {} rows",
                labels.len(),
                self.rows()
            )));
        }
        self.labels = labels;
        Ok(self)
    }

    pub fn with_volumes(mut self, volumes: Vec<Vec<f64>>) -> Result<Self> {
        if volumes.len() != self.n_assets() || volumes.iter().any(|v| v.len() != self.rows()) {
            return Err(EvoAlphaError::DataLoading(
                "Volume columns do not match the return columns".to_string(),
            ));
        }
        self.volumes = Some(volumes);
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.returns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.n_assets() == 0
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn asset_returns(&self, asset: usize) -> &[f64] {
        self.returns.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn asset_volumes(&self, asset: usize) -> Option<&[f64]> {
        self.volumes
            .as_ref()
            .and_then(|v| v.get(asset))
            .map(Vec::as_slice)
    }

    pub fn has_volumes(&self) -> bool {
        self.volumes.is_some()
    }

    /// Rows `[start, start + len)`, truncated at the end of the table.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        let start = start.min(self.rows());
        let end = start.saturating_add(len).min(self.rows());
        let cut = |column: &Vec<f64>| column[start..end].to_vec();
        Self {
            assets: self.assets.clone(),
            labels: if self.labels.is_empty() {
                Vec::new()
            } else {
                self.labels[start..end].to_vec()
            },
            returns: self.returns.iter().map(cut).collect(),
            volumes: self
                .volumes
                .as_ref()
                .map(|v| v.iter().map(cut).collect()),
        }
    }

    /// Last `n` rows; `n == 0` keeps everything.
    pub fn tail(&self, n: usize) -> Self {
        if n == 0 || n >= self.rows() {
            return self.clone();
        }
        self.slice(self.rows() - n, n)
    }

    /// Chronological in-sample / out-of-sample split.
    pub fn split_at_ratio(&self, ratio: f64) -> (Self, Self) {
        let rows = self.rows();
        let split = ((rows as f64) * ratio.clamp(0.0, 1.0)) as usize;
        (self.slice(0, split), self.slice(split, rows - split))
    }

    /// Same shape, with every return replaced by `f(asset, row, value)`.
    pub fn map_returns<F>(&self, f: F) -> Self
    where
        F: Fn(usize, usize, f64) -> f64,
    {
        let returns = self
            .returns
            .iter()
            .enumerate()
            .map(|(asset, column)| {
                column
                    .iter()
                    .enumerate()
                    .map(|(row, &value)| f(asset, row, value))
                    .collect()
            })
            .collect();
        Self {
            assets: self.assets.clone(),
            labels: self.labels.clone(),
            returns,
            volumes: self.volumes.clone(),
        }
    }

    /// Human-readable span such as `2021-01-04_to_2023-06-30`.
    pub fn period(&self) -> Option<String> {
        match (self.labels.first(), self.labels.last()) {
            (Some(first), Some(last)) => Some(format!("{}_to_{}", first, last)),
            _ => None,
        }
    }

    /// Equal-weighted cross-asset return per row.
    pub fn market_returns(&self) -> Vec<f64> {
        let n = self.n_assets();
        if n == 0 {
            return Vec::new();
        }
        (0..self.rows())
            .map(|row| self.returns.iter().map(|c| c[row]).sum::<f64>() / n as f64)
            .collect()
    }
}
