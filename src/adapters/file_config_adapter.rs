//! INI file configuration adapter.

use crate::domain::error::DashboardError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| DashboardError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, DashboardError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| DashboardError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// An adapter with no sections; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[dashboard]
tickers = TATAMOTORS.NS, RELIANCE.NS
period = 1y
volume = yes
overlay_span = 30

[provider]
source = csv
data_dir = fixtures

[proxy]
enabled = false
probability = 0.25
endpoints = 10.0.0.1:8080, 10.0.0.2:8080
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("dashboard", "tickers"),
            Some("TATAMOTORS.NS, RELIANCE.NS".to_string())
        );
        assert_eq!(adapter.get_string("provider", "source"), Some("csv".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("dashboard", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_and_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("dashboard", "overlay_span", 0), 30);
        assert_eq!(adapter.get_int("dashboard", "missing", 42), 42);
        assert_eq!(adapter.get_int("dashboard", "period", 42), 42);
    }

    #[test]
    fn get_double_and_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("proxy", "probability", 0.5), 0.25);
        assert_eq!(adapter.get_double("proxy", "missing", 0.5), 0.5);
        assert_eq!(adapter.get_double("dashboard", "tickers", 0.5), 0.5);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[x]\na = true\nb = yes\nc = 1\nd = off\ne = No\n").unwrap();
        assert!(adapter.get_bool("x", "a", false));
        assert!(adapter.get_bool("x", "b", false));
        assert!(adapter.get_bool("x", "c", false));
        assert!(!adapter.get_bool("x", "d", true));
        assert!(!adapter.get_bool("x", "e", true));
        assert!(adapter.get_bool("x", "missing", true));
    }

    #[test]
    fn get_list_splits_on_commas() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_list("proxy", "endpoints"),
            Some(vec!["10.0.0.1:8080".to_string(), "10.0.0.2:8080".to_string()])
        );
        assert_eq!(adapter.get_list("proxy", "missing"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(!adapter.get_bool("proxy", "enabled", true));
    }

    #[test]
    fn from_file_returns_parse_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(DashboardError::ConfigParse { .. })));
    }

    #[test]
    fn empty_adapter_has_no_values() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("dashboard", "tickers"), None);
        assert!(adapter.get_bool("dashboard", "volume", true));
    }
}
