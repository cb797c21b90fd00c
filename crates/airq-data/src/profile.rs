//! Dataset profiling behind the overview page.
//!
//! Counts and summaries are polars aggregations over the typed frame; the
//! display-safe text copy (`preview`) is only ever used for rendering.

use std::collections::BTreeMap;

use airq_common::error::{AirqError, Result};
use polars::prelude::*;
use serde::Serialize;

use crate::dataset::{cell_texts, DType, Dataset};
use crate::stats::{self, Histogram};

/// Number of KDE evaluation points per density curve.
const DENSITY_POINTS: usize = 100;

/// Alias of the row-count column in grouped frames.
pub(crate) const COUNT: &str = "__count";

#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub cols: usize,
    pub total_missing: usize,
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub numeric_summary: Vec<NumericSummary>,
    pub categorical_summary: Vec<CategoricalSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: DType,
    pub missing: usize,
    /// Percentage of rows missing, rounded to 2 decimals
    pub missing_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub name: String,
    pub unique: usize,
    /// Most frequent value; `None` when the column holds no values
    pub top: Option<String>,
    pub freq: usize,
}

/// Compute every overview metric and table.
pub fn profile(ds: &Dataset) -> Result<DatasetProfile> {
    let columns: Vec<ColumnProfile> = ds
        .frame()
        .get_columns()
        .iter()
        .map(|c| {
            let missing = c.null_count();
            ColumnProfile {
                name: c.name().to_string(),
                dtype: DType::of(c.dtype()),
                missing,
                missing_pct: missing_pct(missing, ds.n_rows()),
            }
        })
        .collect();

    let numeric_summary = ds
        .numeric_column_names()
        .iter()
        .map(|name| numeric_summary(ds, name))
        .collect::<Result<_>>()?;
    let categorical_summary = ds
        .non_numeric_column_names()
        .iter()
        .map(|name| categorical_summary(ds, name))
        .collect::<Result<_>>()?;

    Ok(DatasetProfile {
        rows: ds.n_rows(),
        cols: ds.n_cols(),
        total_missing: columns.iter().map(|c| c.missing).sum(),
        duplicate_rows: duplicate_rows(ds)?,
        numeric_summary,
        categorical_summary,
        columns,
    })
}

fn missing_pct(missing: usize, rows: usize) -> f64 {
    if rows == 0 {
        return 0.0;
    }
    (missing as f64 / rows as f64 * 100.0 * 100.0).round() / 100.0
}

/// Rows identical to an earlier row, cell for cell. Signed zeros compare equal.
pub fn duplicate_rows(ds: &Dataset) -> Result<usize> {
    if ds.n_cols() == 0 || ds.n_rows() == 0 {
        return Ok(0);
    }
    let columns = ds
        .frame()
        .get_columns()
        .iter()
        .map(|c| -> Result<Column> {
            match c.dtype() {
                // -0.0 + 0.0 is +0.0
                DataType::Float64 => Ok((c.f64()? + 0.0).into_series().into()),
                _ => Ok(c.clone()),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    let keys: Vec<Expr> = columns.iter().map(|c| col(c.name().clone())).collect();
    let distinct = DataFrame::new(columns)?
        .lazy()
        .group_by(keys)
        .agg([len().alias(COUNT)])
        .collect()?
        .height();
    Ok(ds.n_rows() - distinct)
}

pub fn numeric_summary(ds: &Dataset, name: &str) -> Result<NumericSummary> {
    let values = ds.floats(name)?;
    Ok(NumericSummary {
        name: name.to_string(),
        count: stats::non_null(&values),
        mean: values.mean(),
        std: stats::sample_std(&values),
        min: values.min(),
        q25: stats::quantile(&values, 0.25),
        median: stats::quantile(&values, 0.5),
        q75: stats::quantile(&values, 0.75),
        max: values.max(),
    })
}

pub fn categorical_summary(ds: &Dataset, name: &str) -> Result<CategoricalSummary> {
    let unique = ds.series(name)?.drop_nulls().n_unique()?;
    // ties resolve to the smallest value
    let top = value_counts(ds, name, 1)?.into_iter().next();
    Ok(CategoricalSummary {
        name: name.to_string(),
        unique,
        freq: top.as_ref().map(|t| t.1).unwrap_or(0),
        top: top.map(|t| t.0),
    })
}

/// Top `limit` values of a column by frequency (ties by value), missing excluded.
pub fn value_counts(ds: &Dataset, name: &str, limit: usize) -> Result<Vec<(String, usize)>> {
    ds.series(name)?;
    let counted = ds
        .frame()
        .clone()
        .lazy()
        .select([col(name)])
        .filter(col(name).is_not_null())
        .group_by([col(name)])
        .agg([len().alias(COUNT)])
        .sort_by_exprs(
            [col(COUNT), col(name)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(limit as IdxSize)
        .collect()?;
    let values = cell_texts(counted.column(name)?.as_materialized_series())?;
    let counts = counts_of(counted.column(COUNT)?)?;
    Ok(values
        .into_iter()
        .zip(counts)
        .filter_map(|(value, count)| Some((value?, count)))
        .collect())
}

pub(crate) fn counts_of(column: &Column) -> Result<Vec<usize>> {
    let cast = column.cast(&DataType::UInt64)?;
    let counts = cast.u64()?.into_iter().map(|c| c.unwrap_or(0) as usize).collect();
    Ok(counts)
}

/// Display-safe copy of the first rows: every cell already rendered as text.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn preview(ds: &Dataset, limit: usize) -> Result<Preview> {
    let head = ds.head(limit);
    let columns = head
        .frame()
        .get_columns()
        .iter()
        .map(|c| cell_texts(c.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;
    let rows = (0..head.n_rows())
        .map(|r| columns.iter().map(|c| c[r].clone().unwrap_or_default()).collect())
        .collect();
    Ok(Preview { headers: ds.column_names(), rows })
}

/// Missing-value presence grid. With more rows than the cap, consecutive rows
/// are binned and each cell holds the fraction of missing cells in its bin.
#[derive(Debug, Clone, Serialize)]
pub struct MissingGrid {
    pub columns: Vec<String>,
    /// Row range `[start, end)` per grid row
    pub row_ranges: Vec<(usize, usize)>,
    /// `cells[row][col]` in 0.0..=1.0
    pub cells: Vec<Vec<f64>>,
}

pub fn missing_grid(ds: &Dataset, max_rows: usize) -> MissingGrid {
    let n = ds.n_rows();
    let bins = n.min(max_rows.max(1));
    let row_ranges: Vec<(usize, usize)> = (0..bins)
        .map(|b| (b * n / bins, (b + 1) * n / bins))
        .collect();

    let cells = row_ranges
        .iter()
        .map(|&(start, end)| {
            let size = end - start;
            ds.frame()
                .slice(start as i64, size)
                .get_columns()
                .iter()
                .map(|c| c.null_count() as f64 / size.max(1) as f64)
                .collect()
        })
        .collect();

    MissingGrid { columns: ds.column_names(), row_ranges, cells }
}

/// Histogram plus a KDE curve scaled to the histogram's count axis.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub column: String,
    pub histogram: Histogram,
    /// `(x, expected count)` points; empty when the density is undefined
    pub density: Vec<(f64, f64)>,
}

/// `None` for non-numeric or empty columns.
pub fn distribution(ds: &Dataset, name: &str) -> Result<Option<Distribution>> {
    if ds.dtype(name)? != DType::Numeric {
        return Ok(None);
    }
    let values = ds.floats(name)?;
    let n = stats::non_null(&values);
    let Some(histogram) = stats::histogram(&values, stats::sturges_bins(n)) else {
        return Ok(None);
    };
    let (lo, hi) = match (histogram.edges.first(), histogram.edges.last()) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => return Ok(None),
    };
    let grid = stats::linspace(lo, hi, DENSITY_POINTS);
    let scale = n as f64 * histogram.bin_width();
    let density = stats::gaussian_kde(&values, &grid)
        .map(|d| grid.iter().zip(d).map(|(x, y)| (*x, y * scale)).collect())
        .unwrap_or_default();
    Ok(Some(Distribution { column: name.to_string(), histogram, density }))
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Symmetric; `None` where the coefficient is undefined
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pearson correlation between the named columns. Needs at least two.
pub fn correlation_matrix(ds: &Dataset, names: &[String]) -> Result<CorrelationMatrix> {
    if names.len() < 2 {
        return Err(AirqError::InsufficientSelection { needed: 2, got: names.len() });
    }
    let series: Vec<Float64Chunked> = names.iter().map(|n| ds.floats(n)).collect::<Result<_>>()?;

    let mut cache: BTreeMap<(usize, usize), Option<f64>> = BTreeMap::new();
    let values = (0..names.len())
        .map(|i| {
            (0..names.len())
                .map(|j| {
                    let key = (i.min(j), i.max(j));
                    let r = *cache
                        .entry(key)
                        .or_insert_with(|| stats::pearson(&series[key.0], &series[key.1]));
                    // exact unit diagonal wherever the series has variance
                    if i == j { r.map(|_| 1.0) } else { r }
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix { names: names.to_vec(), values })
}

/// Correlation over every numeric column of the dataset.
pub fn numeric_correlation(ds: &Dataset) -> Result<CorrelationMatrix> {
    correlation_matrix(ds, &ds.numeric_column_names())
}
