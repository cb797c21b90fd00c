#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_default_eda_selection_sizes() {
        let eda = EdaConfig::default();
        assert_eq!(eda.default_city_count, 3);
        assert_eq!(eda.default_pollutant_count, 2);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, default_port());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.models.regressor_path, default_regressor_path());
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9000

            [overview]
            preview_rows = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.overview.preview_rows, 25);
        assert_eq!(config.overview.heatmap_max_rows, default_heatmap_max_rows());
    }

    #[test]
    fn test_zero_heatmap_rows_rejected() {
        let err = Config::from_toml_str("[overview]\nheatmap_max_rows = 0\n").unwrap_err();
        assert!(err.to_string().contains("heatmap_max_rows"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.eda.default_city_count, 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airq.toml");
        std::fs::write(&path, "[data]\ncsv_path = \"/tmp/aq.csv\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data.csv_path, std::path::PathBuf::from("/tmp/aq.csv"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(Config::from_toml_str("[server]\nport = \"high\"\n").is_err());
    }
}
