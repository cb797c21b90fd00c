//! Pollutant vocabulary and the dataset's well-known column names.

/// Calendar date column.
pub const DATE_COLUMN: &str = "Date";
/// Station city column.
pub const CITY_COLUMN: &str = "City";
/// Computed AQI score column.
pub const AQI_COLUMN: &str = "AQI";
/// AQI category label column.
pub const BUCKET_COLUMN: &str = "AQI_Bucket";

/// Columns that are never treated as pollutant readings.
pub const NON_POLLUTANT_COLUMNS: [&str; 4] = [DATE_COLUMN, CITY_COLUMN, AQI_COLUMN, BUCKET_COLUMN];

/// One of the twelve measured concentrations used as model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pollutant {
    /// Column / feature name, e.g. "PM2.5"
    pub name: &'static str,
    /// Form label shown to users
    pub label: &'static str,
    pub unit: &'static str,
}

pub const POLLUTANTS: [Pollutant; 12] = [
    Pollutant { name: "PM2.5",   label: "PM2.5",   unit: "µg/m³" },
    Pollutant { name: "PM10",    label: "PM10",    unit: "µg/m³" },
    Pollutant { name: "NO",      label: "NO",      unit: "µg/m³" },
    Pollutant { name: "NO2",     label: "NO₂",     unit: "µg/m³" },
    Pollutant { name: "NOx",     label: "NOx",     unit: "µg/m³" },
    Pollutant { name: "NH3",     label: "NH₃",     unit: "µg/m³" },
    Pollutant { name: "CO",      label: "CO",      unit: "mg/m³" },
    Pollutant { name: "SO2",     label: "SO₂",     unit: "µg/m³" },
    Pollutant { name: "O3",      label: "O₃",      unit: "µg/m³" },
    Pollutant { name: "Benzene", label: "Benzene", unit: "µg/m³" },
    Pollutant { name: "Toluene", label: "Toluene", unit: "µg/m³" },
    Pollutant { name: "Xylene",  label: "Xylene",  unit: "µg/m³" },
];

pub fn is_pollutant_column(name: &str) -> bool {
    !NON_POLLUTANT_COLUMNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_distinct_pollutants() {
        let mut names: Vec<&str> = POLLUTANTS.iter().map(|p| p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_pollutant_column_filter() {
        assert!(is_pollutant_column("PM2.5"));
        assert!(!is_pollutant_column("AQI_Bucket"));
        assert!(!is_pollutant_column("Date"));
    }
}
