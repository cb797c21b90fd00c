//! Aggregations behind the exploratory-analysis views.
//!
//! Each view takes the city-filtered dataset and the pollutant selection and
//! returns plain data ready for charting. Grouped means are polars group-bys
//! sorted on their keys, so output is reproducible.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use airq_common::bucket::AqiBucket;
use airq_common::error::{AirqError, Result};
use airq_common::pollutants::{is_pollutant_column, BUCKET_COLUMN, CITY_COLUMN, DATE_COLUMN};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{cell_texts, floats_of, timestamps_of, DType, Dataset};
use crate::profile::{self, counts_of, CorrelationMatrix, COUNT};
use crate::stats::{self, BoxStats};

/// KDE evaluation points per violin.
const VIOLIN_POINTS: usize = 60;

/// How many cities / pollutants are preselected on a first visit.
#[derive(Debug, Clone, Copy)]
pub struct SelectionDefaults {
    pub cities: usize,
    pub pollutants: usize,
}

impl Default for SelectionDefaults {
    fn default() -> Self {
        Self { cities: 3, pollutants: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaSelection {
    pub cities: Vec<String>,
    pub pollutants: Vec<String>,
}

impl EdaSelection {
    /// Resolve a user selection against the dataset. `None` means "not chosen
    /// yet" and picks the defaults; `Some` is taken literally (even when empty),
    /// dropping names the dataset does not know. Output follows option order.
    pub fn resolve(
        ds: &Dataset,
        cities: Option<&[String]>,
        pollutants: Option<&[String]>,
        defaults: SelectionDefaults,
    ) -> Self {
        Self {
            cities: pick(distinct_cities(ds), cities, defaults.cities),
            pollutants: pick(pollutant_columns(ds), pollutants, defaults.pollutants),
        }
    }
}

fn pick(options: Vec<String>, requested: Option<&[String]>, default_count: usize) -> Vec<String> {
    match requested {
        None => options.into_iter().take(default_count).collect(),
        Some(req) => {
            let wanted: HashSet<&str> = req.iter().map(String::as_str).collect();
            options.into_iter().filter(|o| wanted.contains(o.as_str())).collect()
        }
    }
}

fn city_names(ds: &Dataset) -> Result<StringChunked> {
    let cast = ds.series(CITY_COLUMN)?.cast(&DataType::String)?;
    let names = cast.str()?.clone();
    Ok(names)
}

/// Distinct cities in order of first appearance.
pub fn distinct_cities(ds: &Dataset) -> Vec<String> {
    let Ok(cities) = city_names(ds) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    cities
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(*c))
        .map(String::from)
        .collect()
}

/// Every column except date, city, AQI score and AQI category.
pub fn pollutant_columns(ds: &Dataset) -> Vec<String> {
    ds.column_names()
        .into_iter()
        .filter(|n| is_pollutant_column(n))
        .collect()
}

/// Rows whose city is in the selection.
pub fn filter_by_cities(ds: &Dataset, cities: &[String]) -> Result<Dataset> {
    let wanted: HashSet<&str> = cities.iter().map(String::as_str).collect();
    let mask: BooleanChunked = city_names(ds)?
        .into_iter()
        .map(|c| Some(c.is_some_and(|c| wanted.contains(c))))
        .collect();
    let filtered = ds.filter(&mask)?;
    debug!("City filter kept {} of {} rows", filtered.n_rows(), ds.n_rows());
    Ok(filtered)
}

fn require_dates(ds: &Dataset) -> Result<()> {
    if ds.dtype(DATE_COLUMN)? != DType::Date {
        return Err(AirqError::InvalidDataset(format!(
            "column '{}' is not parseable as dates",
            DATE_COLUMN
        )));
    }
    Ok(())
}

/// Mean of each value column per distinct key tuple, sorted by key. Rows with
/// a null key are dropped; non-numeric value columns average to null.
fn group_means(ds: &Dataset, keys: &[&str], values: &[String]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = keys
        .iter()
        .map(|k| ds.series(k).map(|s| s.clone().into()))
        .collect::<Result<_>>()?;
    for v in values {
        columns.push(ds.floats(v)?.into_series().into());
    }
    let mut lf = DataFrame::new(columns)?.lazy();
    for k in keys {
        lf = lf.filter(col(*k).is_not_null());
    }
    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let means: Vec<Expr> = values.iter().map(|v| col(v.as_str()).mean()).collect();
    let grouped = lf
        .group_by(key_exprs.clone())
        .agg(means)
        .sort_by_exprs(key_exprs, SortMultipleOptions::default())
        .collect()?;
    Ok(grouped)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = floats_of(df.column(name)?.as_materialized_series())?.into_iter().collect();
    Ok(values)
}

fn key_texts(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    cell_texts(df.column(name)?.as_materialized_series())
}

fn key_timestamps(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
    timestamps_of(df.column(name)?.as_materialized_series())
}

// ── 1. Trend over time ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
    pub pollutant: String,
    pub points: Vec<TrendPoint>,
}

/// Mean per distinct timestamp, one point for every timestamp present in the data.
pub fn trends(ds: &Dataset, pollutants: &[String]) -> Result<Vec<TrendSeries>> {
    require_dates(ds)?;
    let grouped = group_means(ds, &[DATE_COLUMN], pollutants)?;
    let stamps = key_timestamps(&grouped, DATE_COLUMN)?;
    pollutants
        .iter()
        .map(|p| {
            let points = stamps
                .iter()
                .zip(float_values(&grouped, p)?)
                .filter_map(|(ts, mean)| ts.map(|timestamp| TrendPoint { timestamp, mean }))
                .collect();
            Ok(TrendSeries { pollutant: p.clone(), points })
        })
        .collect()
}

// ── 2 & 6. AQI bucket counts ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: String,
    /// `None` for labels outside the six known buckets
    pub bucket: Option<AqiBucket>,
    pub count: usize,
}

/// Counts per label in order of first appearance.
fn raw_bucket_counts(ds: &Dataset) -> Result<Vec<BucketCount>> {
    ds.series(BUCKET_COLUMN)?;
    let counted = ds
        .frame()
        .clone()
        .lazy()
        .select([col(BUCKET_COLUMN)])
        .filter(col(BUCKET_COLUMN).is_not_null())
        .group_by_stable([col(BUCKET_COLUMN)])
        .agg([len().alias(COUNT)])
        .collect()?;
    let labels = key_texts(&counted, BUCKET_COLUMN)?;
    let counts = counts_of(counted.column(COUNT)?)?;
    Ok(labels
        .into_iter()
        .zip(counts)
        .filter_map(|(label, count)| {
            let label = label?;
            Some(BucketCount { bucket: AqiBucket::from_label(&label), label, count })
        })
        .collect())
}

/// Counts per bucket in severity order; unknown labels follow in order of appearance.
pub fn bucket_distribution(ds: &Dataset) -> Result<Vec<BucketCount>> {
    let mut counts = raw_bucket_counts(ds)?;
    // stable sort keeps first-appearance order among unknown labels
    counts.sort_by_key(|c| c.bucket.map(|b| b.code()).unwrap_or(i64::MAX));
    Ok(counts)
}

/// Bucket shares for the pie view, largest first.
pub fn bucket_shares(ds: &Dataset) -> Result<Vec<BucketCount>> {
    let mut counts = bucket_distribution(ds)?;
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

// ── 3 & 8. Per-city distributions ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CityGroups<T> {
    pub pollutant: String,
    /// One entry per city in order of appearance; `None` when the city has no values
    pub groups: Vec<(String, Option<T>)>,
}

fn per_city<T>(
    ds: &Dataset,
    pollutants: &[String],
    summarise: impl Fn(&Float64Chunked) -> Option<T>,
) -> Result<Vec<CityGroups<T>>> {
    let names = city_names(ds)?;
    let cities = distinct_cities(ds);
    pollutants
        .iter()
        .map(|p| {
            let values = ds.floats(p)?;
            let groups = cities
                .iter()
                .map(|c| {
                    let in_city = values.filter(&names.equal(c.as_str()))?;
                    Ok((c.clone(), summarise(&in_city)))
                })
                .collect::<Result<_>>()?;
            Ok(CityGroups { pollutant: p.clone(), groups })
        })
        .collect()
}

pub fn boxplots(ds: &Dataset, pollutants: &[String]) -> Result<Vec<CityGroups<BoxStats>>> {
    per_city(ds, pollutants, BoxStats::from_values)
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolinShape {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub count: usize,
    /// `(y, density)` outline; empty when the density is undefined
    pub outline: Vec<(f64, f64)>,
}

impl ViolinShape {
    pub fn from_values(values: &Float64Chunked) -> Option<Self> {
        let (min, max) = (values.min()?, values.max()?);
        let median = stats::quantile(values, 0.5)?;
        let outline = stats::scott_bandwidth(values)
            .and_then(|bw| {
                // extend the grid slightly past the data like a cut=2 violin
                let grid = stats::linspace(min - 2.0 * bw, max + 2.0 * bw, VIOLIN_POINTS);
                stats::gaussian_kde(values, &grid).map(|d| grid.into_iter().zip(d).collect())
            })
            .unwrap_or_default();
        Some(Self { min, max, median, count: stats::non_null(values), outline })
    }
}

pub fn violins(ds: &Dataset, pollutants: &[String]) -> Result<Vec<CityGroups<ViolinShape>>> {
    per_city(ds, pollutants, ViolinShape::from_values)
}

// ── 4. City × date heatmap ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Pivot {
    pub pollutant: String,
    pub cities: Vec<String>,
    pub timestamps: Vec<NaiveDateTime>,
    /// `cells[city][timestamp]`, mean of the pollutant
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn heatmaps(ds: &Dataset, pollutants: &[String]) -> Result<Vec<Pivot>> {
    require_dates(ds)?;
    let grouped = group_means(ds, &[CITY_COLUMN, DATE_COLUMN], pollutants)?;
    let cities = key_texts(&grouped, CITY_COLUMN)?;
    let stamps = key_timestamps(&grouped, DATE_COLUMN)?;
    let keys: Vec<Option<(String, NaiveDateTime)>> = cities
        .into_iter()
        .zip(stamps)
        .map(|(c, t)| c.zip(t))
        .collect();
    let all_cities: Vec<String> = keys
        .iter()
        .flatten()
        .map(|(c, _)| c.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let all_stamps: Vec<NaiveDateTime> = keys
        .iter()
        .flatten()
        .map(|(_, t)| *t)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    pollutants
        .iter()
        .map(|p| {
            let means: BTreeMap<(String, NaiveDateTime), Option<f64>> = keys
                .iter()
                .zip(float_values(&grouped, p)?)
                .filter_map(|(key, mean)| key.clone().map(|k| (k, mean)))
                .collect();
            let cells = all_cities
                .iter()
                .map(|c| {
                    all_stamps
                        .iter()
                        .map(|t| means.get(&(c.clone(), *t)).copied().flatten())
                        .collect()
                })
                .collect();
            Ok(Pivot {
                pollutant: p.clone(),
                cities: all_cities.clone(),
                timestamps: all_stamps.clone(),
                cells,
            })
        })
        .collect()
}

// ── 5. Correlation ───────────────────────────────────────────────────────────

/// Pearson matrix over the selected pollutants; fewer than two is an
/// `InsufficientSelection`.
pub fn correlation(ds: &Dataset, pollutants: &[String]) -> Result<CorrelationMatrix> {
    profile::correlation_matrix(ds, pollutants)
}

// ── 7. Average by city ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CityAverages {
    pub pollutant: String,
    /// Cities sorted by name
    pub values: Vec<(String, Option<f64>)>,
}

pub fn city_averages(ds: &Dataset, pollutants: &[String]) -> Result<Vec<CityAverages>> {
    let grouped = group_means(ds, &[CITY_COLUMN], pollutants)?;
    let cities = key_texts(&grouped, CITY_COLUMN)?;
    pollutants
        .iter()
        .map(|p| {
            let values = cities
                .iter()
                .zip(float_values(&grouped, p)?)
                .filter_map(|(c, mean)| c.clone().map(|c| (c, mean)))
                .collect();
            Ok(CityAverages { pollutant: p.clone(), values })
        })
        .collect()
}
