//! The air-quality table, held as a polars `DataFrame`.
//!
//! Column types are normalised once at load time: numeric columns become
//! `Float64`, text columns whose cells all parse as dates or date-times become
//! millisecond `Datetime`, everything else stays text. Missing cells are nulls.
//! The frame is never mutated after loading; filtered views are new `Dataset`s.

use std::io::{Cursor, Read};
use std::path::Path;

use airq_common::error::{AirqError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Cell texts read as nulls, in addition to empty cells.
const MISSING_MARKERS: [&str; 5] = ["NA", "NaN", "nan", "null", "None"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Numeric,
    Date,
    Text,
}

impl DType {
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Numeric => "numeric",
            DType::Date    => "date",
            DType::Text    => "text",
        }
    }

    /// Dashboard category of a polars dtype.
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_float() || dtype.is_integer() {
            DType::Numeric
        } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
            DType::Date
        } else {
            DType::Text
        }
    }
}

fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Formats a float without trailing noise: integers print bare, others with up to 4 decimals.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{:.0}", x)
    } else {
        let s = format!("{:.4}", x);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Midnight timestamps print as a bare date.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(cell, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(cell, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms).map(|d| d.naive_utc())
}

/// Text column re-typed as `Datetime` when every present cell is a date or
/// date-time. Times of day are kept.
fn parse_dates(column: &Column) -> Result<Option<Column>> {
    let Ok(cells) = column.str() else {
        return Ok(None);
    };
    let mut millis = Vec::with_capacity(cells.len());
    let mut any = false;
    for cell in cells.into_iter() {
        match cell {
            None => millis.push(None),
            Some(text) => match parse_timestamp(text) {
                Some(ts) => {
                    any = true;
                    millis.push(Some(ts.and_utc().timestamp_millis()));
                }
                None => return Ok(None),
            },
        }
    }
    if !any {
        return Ok(None);
    }
    let series = Series::new(column.name().clone(), millis).cast(&timestamp_dtype())?;
    Ok(Some(series.into()))
}

fn normalize(column: &Column) -> Result<Column> {
    match DType::of(column.dtype()) {
        DType::Numeric => Ok(column.cast(&DataType::Float64)?),
        DType::Date => Ok(column.cast(&timestamp_dtype())?),
        DType::Text => Ok(parse_dates(column)?.unwrap_or_else(|| column.clone())),
    }
}

/// Values as `f64`; non-numeric series read as all-null.
pub fn floats_of(series: &Series) -> Result<Float64Chunked> {
    if DType::of(series.dtype()) != DType::Numeric {
        return Ok(Float64Chunked::full_null(series.name().clone(), series.len()));
    }
    let cast = series.cast(&DataType::Float64)?;
    let values = cast.f64()?.clone();
    Ok(values)
}

/// Values of a date series as timestamps.
pub fn timestamps_of(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    if DType::of(series.dtype()) != DType::Date {
        return Err(AirqError::InvalidDataset(format!(
            "column '{}' does not hold dates",
            series.name()
        )));
    }
    let millis = series.cast(&timestamp_dtype())?.cast(&DataType::Int64)?;
    let values = millis.i64()?.into_iter().map(|v| v.and_then(from_millis)).collect();
    Ok(values)
}

/// Cells rendered as display text; nulls stay `None`.
pub fn cell_texts(series: &Series) -> Result<Vec<Option<String>>> {
    let texts = match DType::of(series.dtype()) {
        DType::Numeric => floats_of(series)?.into_iter().map(|v| v.map(format_number)).collect(),
        DType::Date => timestamps_of(series)?.into_iter().map(|v| v.map(format_timestamp)).collect(),
        DType::Text => {
            let cast = series.cast(&DataType::String)?;
            let texts = cast.str()?.into_iter().map(|v| v.map(String::from)).collect();
            texts
        }
    };
    Ok(texts)
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    /// Wrap a frame, normalising column types.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(normalize)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { df: DataFrame::new(columns)? })
    }

    /// Load from a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        debug!("Loading dataset from {:?}", path);
        let df = csv_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        let dataset = Self::from_frame(df)?;
        info!(
            "Loaded dataset {:?}: {} rows, {} columns",
            path,
            dataset.n_rows(),
            dataset.n_cols()
        );
        Ok(dataset)
    }

    /// Load from any CSV source with a header row.
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let df = csv_options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Self::from_frame(df)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn n_rows(&self) -> usize {
        self.df.height()
    }

    pub fn n_cols(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Named column, or `MissingColumn`.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| AirqError::MissingColumn(name.to_string()))
    }

    pub fn dtype(&self, name: &str) -> Result<DType> {
        Ok(DType::of(self.series(name)?.dtype()))
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.names_where(|t| t == DType::Numeric)
    }

    pub fn non_numeric_column_names(&self) -> Vec<String> {
        self.names_where(|t| t != DType::Numeric)
    }

    fn names_where(&self, keep: impl Fn(DType) -> bool) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| keep(DType::of(c.dtype())))
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn floats(&self, name: &str) -> Result<Float64Chunked> {
        floats_of(self.series(name)?)
    }

    pub fn timestamps(&self, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
        timestamps_of(self.series(name)?)
    }

    pub fn texts(&self, name: &str) -> Result<Vec<Option<String>>> {
        cell_texts(self.series(name)?)
    }

    /// Rows where `mask` is true, in their original order.
    pub fn filter(&self, mask: &BooleanChunked) -> Result<Dataset> {
        Ok(Self { df: self.df.filter(mask)? })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        Self { df: self.df.head(Some(n)) }
    }
}

fn csv_options() -> CsvReadOptions {
    let markers = MISSING_MARKERS.iter().map(|m| (*m).into()).collect();
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(markers))),
        )
}
