//! Dashboard settings read from the `[dashboard]` section.

use crate::domain::error::DashboardError;
use crate::domain::indicator::{Indicator, OverlayAverages};
use crate::domain::overview::{Exchange, OverviewOptions};
use crate::domain::period::{Interval, Period};
use crate::domain::session::PageInput;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT: &str = "dashboard.html";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub input: PageInput,
    pub overview: OverviewOptions,
    pub output: PathBuf,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            input: PageInput::default(),
            overview: OverviewOptions::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl DashboardSettings {
    /// Builds settings from `[dashboard]`, falling back to defaults for absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DashboardError> {
        let period = match config.get_string("dashboard", "period") {
            Some(s) => s
                .parse::<Period>()
                .map_err(|e| DashboardError::invalid("dashboard", "period", e))?,
            None => Period::default(),
        };

        let interval = config
            .get_string("dashboard", "interval")
            .map(|s| {
                s.parse::<Interval>()
                    .map_err(|e| DashboardError::invalid("dashboard", "interval", e))
            })
            .transpose()?;

        let indicators = config
            .get_list("dashboard", "indicators")
            .unwrap_or_default()
            .iter()
            .map(|s| {
                s.parse::<Indicator>()
                    .map_err(|e| DashboardError::invalid("dashboard", "indicators", e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let overlay_span = match config.get_string("dashboard", "overlay_span") {
            Some(s) => Some(s.trim().parse::<usize>().map_err(|_| {
                DashboardError::invalid(
                    "dashboard",
                    "overlay_span",
                    "overlay_span must be a whole number",
                )
            })?),
            None => None,
        };

        let exchanges = match config.get_list("dashboard", "exchanges") {
            Some(names) => names
                .iter()
                .map(|s| {
                    s.parse::<Exchange>()
                        .map_err(|e| DashboardError::invalid("dashboard", "exchanges", e))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Exchange::ALL.to_vec(),
        };

        let input = PageInput {
            tickers: config
                .get_string("dashboard", "tickers")
                .filter(|s| !s.trim().is_empty()),
            period,
            interval,
            volume: config.get_bool("dashboard", "volume", true),
            indicators,
            overlay_span,
            overlay_averages: OverlayAverages {
                sma: config.get_bool("dashboard", "overlay_sma", true),
                ema: config.get_bool("dashboard", "overlay_ema", true),
            },
            refresh: false,
            dark_mode: config
                .get_string("dashboard", "dark_mode")
                .map(|_| config.get_bool("dashboard", "dark_mode", false)),
        };

        Ok(Self {
            input,
            overview: OverviewOptions {
                show_indices: config.get_bool("dashboard", "show_indices", true),
                exchanges,
            },
            output: config
                .get_string("dashboard", "output")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<&'static str, &'static str>);

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            assert_eq!(section, "dashboard");
            self.0.get(key).map(|v| v.to_string())
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    #[test]
    fn defaults_when_section_is_empty() {
        let settings = DashboardSettings::from_config(&MapConfig(HashMap::new())).unwrap();
        assert_eq!(settings, DashboardSettings::default());
        assert_eq!(settings.input.period, Period::ThreeMonths);
        assert!(settings.input.volume);
        assert_eq!(settings.overview.exchanges, vec![Exchange::Nse, Exchange::Bse]);
    }

    #[test]
    fn reads_every_key() {
        let config = MapConfig(HashMap::from([
            ("tickers", "TATAMOTORS.NS, RELIANCE.NS"),
            ("period", "1y"),
            ("interval", "1wk"),
            ("volume", "false"),
            ("indicators", "SMA_20, MACD"),
            ("overlay_span", "30"),
            ("overlay_ema", "false"),
            ("show_indices", "false"),
            ("exchanges", "BSE"),
            ("dark_mode", "true"),
            ("output", "out/page.html"),
        ]));
        let settings = DashboardSettings::from_config(&config).unwrap();

        assert_eq!(settings.input.tickers.as_deref(), Some("TATAMOTORS.NS, RELIANCE.NS"));
        assert_eq!(settings.input.period, Period::OneYear);
        assert_eq!(settings.input.interval, Some(Interval::OneWeek));
        assert!(!settings.input.volume);
        assert_eq!(settings.input.indicators, vec![Indicator::Sma(20), Indicator::Macd]);
        assert_eq!(settings.input.overlay_span, Some(30));
        assert_eq!(
            settings.input.overlay_averages,
            OverlayAverages { sma: true, ema: false }
        );
        assert_eq!(settings.input.dark_mode, Some(true));
        assert!(!settings.overview.show_indices);
        assert_eq!(settings.overview.exchanges, vec![Exchange::Bse]);
        assert_eq!(settings.output, PathBuf::from("out/page.html"));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let config = MapConfig(HashMap::from([("indicators", "SMA_20, FOO")]));
        let err = DashboardSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, DashboardError::ConfigInvalid { ref key, .. } if key == "indicators"));

        let config = MapConfig(HashMap::from([("overlay_span", "wide")]));
        assert!(DashboardSettings::from_config(&config).is_err());
    }
}
