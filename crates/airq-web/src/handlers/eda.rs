//! Exploratory data analysis — eight chart views over the city-filtered dataset.

use airq_common::error::{AirqError, Result};
use airq_data::dataset::format_timestamp;
use airq_data::eda::{self, BucketCount, EdaSelection, SelectionDefaults};
use airq_data::Dataset;
use tracing::{debug, warn};

use crate::charts::{self, Bar, HeatScale, Slice, Trace};
use crate::handlers::layout::{card, error_card, html_escape, page_shell, placeholder, warning};
use crate::registry::{Page, PageQuery, PageRequest};
use crate::state::AppState;

const UNKNOWN_BUCKET_COLOR: &str = "#9ca3af";

pub fn render(state: &AppState, req: &PageRequest) -> Result<String> {
    let ds = &state.dataset;
    let selection = selection_from_query(state, &req.query);
    debug!(
        cities = selection.cities.len(),
        pollutants = selection.pollutants.len(),
        "Rendering EDA"
    );

    let views = if selection.cities.is_empty() || selection.pollutants.is_empty() {
        empty_views(&selection)
    } else {
        match eda::filter_by_cities(ds, &selection.cities) {
            Ok(filtered) => render_views(&filtered, &selection.pollutants),
            Err(e) => {
                warn!(error = %e, "City filter unavailable");
                format!("{}{}", warning(&e.to_string()), empty_views(&selection))
            }
        }
    };

    let body = format!(
        r#"<div class="eda-layout">
<aside class="filters">{}</aside>
<div class="eda-views">{}</div>
</div>"#,
        filter_form(ds, &selection),
        views
    );
    Ok(page_shell(&state.registry, Page::Eda, "Trends, distributions and correlations by city", &body))
}

/// `filtered=true` marks a submitted filter form, whose selections are taken
/// literally even when empty. Without it, an empty list means "use defaults".
pub fn selection_from_query(state: &AppState, q: &PageQuery) -> EdaSelection {
    let defaults = SelectionDefaults {
        cities: state.config.eda.default_city_count,
        pollutants: state.config.eda.default_pollutant_count,
    };
    EdaSelection::resolve(
        &state.dataset,
        literal(q.filtered, &q.city),
        literal(q.filtered, &q.pollutant),
        defaults,
    )
}

fn literal(filtered: bool, values: &[String]) -> Option<&[String]> {
    (filtered || !values.is_empty()).then_some(values)
}

fn checkboxes(name: &str, options: &[String], selected: &[String]) -> String {
    options
        .iter()
        .map(|o| {
            format!(
                r#"<label class="check"><input type="checkbox" name="{}" value="{v}"{}> {v}</label>"#,
                name,
                if selected.contains(o) { " checked" } else { "" },
                v = html_escape(o),
            )
        })
        .collect()
}

fn filter_form(ds: &Dataset, sel: &EdaSelection) -> String {
    format!(
        r#"<form method="get" action="/eda" class="filter-form">
    <h3>Filters</h3>
    <input type="hidden" name="filtered" value="true">
    <fieldset><legend>Select City/Cities</legend>{}</fieldset>
    <fieldset><legend>Select Pollutant(s)</legend>{}</fieldset>
    <button type="submit" class="btn btn-primary">Apply</button>
</form>"#,
        checkboxes("city", &eda::distinct_cities(ds), &sel.cities),
        checkboxes("pollutant", &eda::pollutant_columns(ds), &sel.pollutants),
    )
}

const VIEW_TITLES: [&str; 8] = [
    "Trend Over Time",
    "AQI Bucket Distribution",
    "Boxplots",
    "Heatmaps",
    "Correlation Matrix",
    "Pie Chart of AQI Buckets",
    "Average by City",
    "Violin Plots",
];

fn empty_views(sel: &EdaSelection) -> String {
    let msg = if sel.cities.is_empty() {
        "Select at least one city to see this chart."
    } else {
        "Select at least one pollutant to see this chart."
    };
    VIEW_TITLES.iter().map(|t| card(t, &placeholder(msg))).collect()
}

/// A failing view never takes the page down: degradations render as
/// warnings, anything else as an error card.
fn view(title: &str, result: Result<String>) -> String {
    let inner = match result {
        Ok(html) => html,
        Err(e) if e.is_degradation() => {
            warn!(view = title, error = %e, "View degraded");
            match e {
                AirqError::MissingColumn(col) => warning(&format!("Column '{}' not found in the dataset.", col)),
                other => warning(&other.to_string()),
            }
        }
        Err(e) => {
            warn!(view = title, error = %e, "View failed");
            error_card(&e.to_string())
        }
    };
    card(title, &inner)
}

fn grid(svgs: impl IntoIterator<Item = String>) -> String {
    let cells: String = svgs
        .into_iter()
        .map(|s| format!(r#"<div class="chart-cell">{}</div>"#, s))
        .collect();
    format!(r#"<div class="chart-grid">{}</div>"#, cells)
}

fn render_views(ds: &Dataset, pollutants: &[String]) -> String {
    [
        view(VIEW_TITLES[0], trend_view(ds, pollutants)),
        view(VIEW_TITLES[1], bucket_bar_view(ds)),
        view(VIEW_TITLES[2], box_view(ds, pollutants)),
        view(VIEW_TITLES[3], heatmap_view(ds, pollutants)),
        view(VIEW_TITLES[4], correlation_view(ds, pollutants)),
        view(VIEW_TITLES[5], bucket_pie_view(ds)),
        view(VIEW_TITLES[6], average_view(ds, pollutants)),
        view(VIEW_TITLES[7], violin_view(ds, pollutants)),
    ]
    .concat()
}

fn trend_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    let series = eda::trends(ds, pollutants)?;
    Ok(grid(series.iter().map(|s| {
        let labels: Vec<String> = s.points.iter().map(|p| format_timestamp(p.timestamp)).collect();
        let line = Trace {
            name: s.pollutant.clone(),
            values: s.points.iter().map(|p| p.mean).collect(),
        };
        charts::line_chart(&format!("{} Trend Over Time", s.pollutant), &labels, &[line])
    })))
}

fn bucket_color(b: &BucketCount) -> String {
    b.bucket.map(|b| b.color()).unwrap_or(UNKNOWN_BUCKET_COLOR).to_string()
}

fn bucket_bar_view(ds: &Dataset) -> Result<String> {
    let counts = eda::bucket_distribution(ds)?;
    let bars: Vec<Bar> = counts
        .iter()
        .map(|b| Bar {
            label: b.label.clone(),
            value: Some(b.count as f64),
            color: bucket_color(b),
            annotation: b.count.to_string(),
        })
        .collect();
    Ok(charts::bar_chart("AQI Bucket Distribution", &bars))
}

fn box_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    let groups = eda::boxplots(ds, pollutants)?;
    Ok(grid(groups.iter().map(|g| {
        charts::box_chart(&format!("{} Distribution per City", g.pollutant), &g.groups)
    })))
}

fn heatmap_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    let pivots = eda::heatmaps(ds, pollutants)?;
    Ok(grid(pivots.iter().map(|p| {
        let (lo, hi) = p
            .cells
            .iter()
            .flatten()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let dates: Vec<String> = p.timestamps.iter().copied().map(format_timestamp).collect();
        charts::heatmap(
            &format!("{} Heatmap: City vs Date", p.pollutant),
            &p.cities,
            &dates,
            &p.cells,
            HeatScale::Sequential(lo, hi),
            false,
        )
    })))
}

fn correlation_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    match eda::correlation(ds, pollutants) {
        Ok(m) => Ok(charts::heatmap("Correlation Matrix", &m.names, &m.names, &m.values, HeatScale::Diverging, true)),
        Err(AirqError::InsufficientSelection { .. }) => {
            Ok(placeholder("Select at least 2 pollutants for correlation matrix."))
        }
        Err(e) => Err(e),
    }
}

fn bucket_pie_view(ds: &Dataset) -> Result<String> {
    let shares = eda::bucket_shares(ds)?;
    let slices: Vec<Slice> = shares
        .iter()
        .map(|b| Slice { label: b.label.clone(), count: b.count, color: bucket_color(b) })
        .collect();
    Ok(charts::pie_chart("Proportion of AQI Buckets", &slices))
}

fn average_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    let averages = eda::city_averages(ds, pollutants)?;
    Ok(grid(averages.iter().enumerate().map(|(i, a)| {
        let bars: Vec<Bar> = a
            .values
            .iter()
            .map(|(city, v)| Bar {
                label: city.clone(),
                value: *v,
                color: charts::series_color(i).to_string(),
                annotation: v.map(|v| format!("{:.2}", v)).unwrap_or_default(),
            })
            .collect();
        charts::bar_chart(&format!("Average {} by City", a.pollutant), &bars)
    })))
}

fn violin_view(ds: &Dataset, pollutants: &[String]) -> Result<String> {
    let groups = eda::violins(ds, pollutants)?;
    Ok(grid(groups.iter().map(|g| {
        charts::violin_chart(&format!("{} Violin Plot per City", g.pollutant), &g.groups)
    })))
}
