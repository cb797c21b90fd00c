//! Dataset overview — shape, column info, summary statistics and distributions.

use airq_common::error::{AirqError, Result};
use airq_data::dataset::format_number;
use airq_data::profile::{self, DatasetProfile};
use airq_data::Dataset;
use tracing::{debug, warn};

use crate::charts::{self, HeatScale};
use crate::handlers::layout::{card, html_escape, metric, page_shell, placeholder, table, warning};
use crate::registry::{Page, PageRequest};
use crate::state::AppState;

const TOP_VALUES: usize = 10;

pub fn render(state: &AppState, req: &PageRequest) -> Result<String> {
    let ds = &state.dataset;
    let prof = profile::profile(ds)?;
    debug!(rows = prof.rows, cols = prof.cols, "Rendering overview");

    let body = format!(
        r##"<div class="stats-grid">{metrics}</div>
<div class="tabs">
    <a href="#preview" class="tab">Data Preview</a>
    <a href="#columns" class="tab">Column Info</a>
    <a href="#summary" class="tab">Summary Stats</a>
    <a href="#visuals" class="tab">Visualizations</a>
</div>
<section id="preview">{preview}</section>
<section id="columns">{columns}</section>
<section id="summary">{summary}</section>
<section id="visuals">{visuals}</section>"##,
        metrics = render_metrics(&prof),
        preview = render_preview(state, req.query.column.as_deref()),
        columns = render_column_info(&prof),
        summary = render_summary(&prof),
        visuals = render_visuals(state),
    );
    Ok(page_shell(&state.registry, Page::Overview, "Shape, types, missing values and distributions", &body))
}

fn render_metrics(prof: &DatasetProfile) -> String {
    [
        metric("Total Rows", prof.rows),
        metric("Total Columns", prof.cols),
        metric("Missing Values", prof.total_missing),
        metric("Duplicate Rows", prof.duplicate_rows),
    ]
    .concat()
}

fn render_preview(state: &AppState, selected: Option<&str>) -> String {
    let ds = &state.dataset;
    let preview_card = match profile::preview(ds, state.config.overview.preview_rows) {
        Ok(p) => card(
            &format!("Dataset Preview (first {} rows)", p.rows.len()),
            &table(&p.headers, &p.rows),
        ),
        Err(e) => card("Dataset Preview", &warning(&e.to_string())),
    };
    format!("{}{}", preview_card, render_value_counts(ds, selected))
}

fn render_value_counts(ds: &Dataset, selected: Option<&str>) -> String {
    let names = ds.column_names();
    let Some(default) = names.first() else {
        return card("Unique Values", &placeholder("The dataset has no columns."));
    };
    let name = selected.filter(|s| !s.is_empty()).unwrap_or(default.as_str());

    let options: String = names
        .iter()
        .map(|n| {
            format!(
                r#"<option value="{v}"{sel}>{v}</option>"#,
                v = html_escape(n),
                sel = if n == name { " selected" } else { "" }
            )
        })
        .collect();
    let form = format!(
        r##"<form method="get" action="/overview#preview" class="inline-form">
    <label for="column">Select a column to explore unique values</label>
    <select name="column" id="column">{}</select>
    <button type="submit" class="btn btn-outline btn-sm">Show</button>
</form>"##,
        options
    );

    let result = match profile::value_counts(ds, name, TOP_VALUES) {
        Ok(counts) if counts.is_empty() => placeholder("No values in this column."),
        Ok(counts) => {
            let rows: Vec<Vec<String>> = counts
                .into_iter()
                .map(|(value, count)| vec![value, count.to_string()])
                .collect();
            table(&[name.to_string(), "count".to_string()], &rows)
        }
        Err(e) => {
            warn!(column = name, error = %e, "Value counts unavailable");
            warning(&e.to_string())
        }
    };
    card("Unique Values", &format!("{}{}", form, result))
}

fn render_column_info(prof: &DatasetProfile) -> String {
    let rows: Vec<Vec<String>> = prof
        .columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.dtype.as_str().to_string(),
                c.missing.to_string(),
                format!("{:.2}", c.missing_pct),
            ]
        })
        .collect();
    let headers = ["Column", "Data Type", "Missing Count", "Missing %"].map(String::from);
    card("Column Information", &table(&headers, &rows))
}

fn stat(v: Option<f64>) -> String {
    v.map(format_number).unwrap_or_else(|| "–".to_string())
}

fn render_summary(prof: &DatasetProfile) -> String {
    let numeric = if prof.numeric_summary.is_empty() {
        placeholder("No numeric columns.")
    } else {
        let rows: Vec<Vec<String>> = prof
            .numeric_summary
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.count.to_string(),
                    stat(s.mean),
                    stat(s.std),
                    stat(s.min),
                    stat(s.q25),
                    stat(s.median),
                    stat(s.q75),
                    stat(s.max),
                ]
            })
            .collect();
        let headers = ["Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"].map(String::from);
        table(&headers, &rows)
    };

    let categorical = if prof.categorical_summary.is_empty() {
        placeholder("No categorical columns.")
    } else {
        let rows: Vec<Vec<String>> = prof
            .categorical_summary
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.unique.to_string(),
                    s.top.clone().unwrap_or_else(|| "none".to_string()),
                    s.freq.to_string(),
                ]
            })
            .collect();
        let headers = ["Column", "Unique Values", "Top Value", "Frequency"].map(String::from);
        table(&headers, &rows)
    };

    format!(
        "{}{}",
        card("Numerical Summary", &numeric),
        card("Categorical Summary", &categorical)
    )
}

fn render_visuals(state: &AppState) -> String {
    let ds = &state.dataset;

    let grid = profile::missing_grid(ds, state.config.overview.heatmap_max_rows);
    let row_labels: Vec<String> = grid
        .row_ranges
        .iter()
        .map(|&(start, end)| if end - start <= 1 { start.to_string() } else { format!("{}–{}", start, end - 1) })
        .collect();
    let cells: Vec<Vec<Option<f64>>> = grid
        .cells
        .iter()
        .map(|r| r.iter().map(|v| Some(*v)).collect())
        .collect();
    let missing_svg = charts::heatmap(
        "Missing Values Heatmap",
        &row_labels,
        &grid.columns,
        &cells,
        HeatScale::Sequential(0.0, 1.0),
        false,
    );

    let histograms: String = ds
        .numeric_column_names()
        .iter()
        .map(|name| {
            let title = format!("Distribution of {}", name);
            match profile::distribution(ds, name) {
                Ok(Some(d)) => charts::histogram_chart(&title, &d),
                Ok(None) => charts::empty_chart(&title, "No values to plot"),
                Err(e) => warning(&e.to_string()),
            }
        })
        .map(|svg| format!(r#"<div class="chart-cell">{}</div>"#, svg))
        .collect();

    let correlation = match profile::numeric_correlation(ds) {
        Ok(m) => charts::heatmap("Correlation Heatmap", &m.names, &m.names, &m.values, HeatScale::Diverging, true),
        Err(AirqError::InsufficientSelection { .. }) => {
            placeholder("Not enough numeric columns for correlation heatmap.")
        }
        Err(e) => warning(&e.to_string()),
    };

    format!(
        r#"{}{}{}"#,
        card("Missing Values Heatmap", &missing_svg),
        card("Distribution of Numerical Columns", &format!(r#"<div class="chart-grid">{}</div>"#, histograms)),
        card("Correlation Heatmap", &correlation),
    )
}
