//! Configuration validation.
//!
//! Checks every section before a dashboard is rendered or served.

use crate::domain::error::DashboardError;
use crate::domain::indicator::{Indicator, MAX_OVERLAY_SPAN, MIN_OVERLAY_SPAN};
use crate::domain::overview::Exchange;
use crate::domain::period::{Interval, Period};
use crate::ports::config_port::ConfigPort;
use std::net::SocketAddr;

pub const PROVIDER_SOURCES: [&str; 2] = ["yahoo", "csv"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_dashboard_config(config)?;
    validate_provider_config(config)?;
    validate_proxy_config(config)?;
    validate_tables_config(config)?;
    validate_web_config(config)?;
    Ok(())
}

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_period_interval(config)?;
    validate_indicators(config)?;
    validate_overlay_span(config)?;
    validate_exchanges(config)?;
    Ok(())
}

pub fn validate_provider_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_source(config)?;
    validate_timeout(config, "provider")?;
    Ok(())
}

pub fn validate_proxy_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_probability(config)?;
    validate_scheme(config)?;
    Ok(())
}

pub fn validate_tables_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_timeout(config, "tables")
}

pub fn validate_web_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    match config.get_string("web", "listen") {
        Some(listen) if listen.trim().parse::<SocketAddr>().is_err() => Err(DashboardError::invalid(
            "web",
            "listen",
            format!("{} is not a socket address", listen.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_period_interval(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let period = match config.get_string("dashboard", "period") {
        Some(s) => s
            .parse::<Period>()
            .map_err(|e| DashboardError::invalid("dashboard", "period", e))?,
        None => Period::default(),
    };

    if let Some(s) = config.get_string("dashboard", "interval") {
        let interval = s
            .parse::<Interval>()
            .map_err(|e| DashboardError::invalid("dashboard", "interval", e))?;
        if !interval.is_allowed_for(period) {
            return Err(DashboardError::invalid(
                "dashboard",
                "interval",
                format!("interval {} is not available for period {}", interval, period),
            ));
        }
    }
    Ok(())
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    for name in config.get_list("dashboard", "indicators").unwrap_or_default() {
        let indicator = name
            .parse::<Indicator>()
            .map_err(|e| DashboardError::invalid("dashboard", "indicators", e))?;
        if !indicator.is_selectable() {
            return Err(DashboardError::invalid(
                "dashboard",
                "indicators",
                format!("{} is not one of the selectable indicators", indicator),
            ));
        }
    }
    Ok(())
}

fn validate_overlay_span(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    if config.get_string("dashboard", "overlay_span").is_none() {
        return Ok(());
    }
    let span = config.get_int("dashboard", "overlay_span", -1);
    if span < MIN_OVERLAY_SPAN as i64 || span > MAX_OVERLAY_SPAN as i64 {
        return Err(DashboardError::invalid(
            "dashboard",
            "overlay_span",
            format!(
                "overlay_span must be between {} and {}",
                MIN_OVERLAY_SPAN, MAX_OVERLAY_SPAN
            ),
        ));
    }
    Ok(())
}

fn validate_exchanges(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    for name in config.get_list("dashboard", "exchanges").unwrap_or_default() {
        name.parse::<Exchange>()
            .map_err(|e| DashboardError::invalid("dashboard", "exchanges", e))?;
    }
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let source = config
        .get_string("provider", "source")
        .unwrap_or_else(|| PROVIDER_SOURCES[0].to_string())
        .trim()
        .to_lowercase();

    if !PROVIDER_SOURCES.contains(&source.as_str()) {
        return Err(DashboardError::invalid(
            "provider",
            "source",
            format!("unknown source {} (choose yahoo or csv)", source),
        ));
    }

    if source == "csv" {
        match config.get_string("provider", "data_dir") {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => {
                return Err(DashboardError::ConfigMissing {
                    section: "provider".to_string(),
                    key: "data_dir".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort, section: &str) -> Result<(), DashboardError> {
    if config.get_string(section, "timeout_secs").is_none() {
        return Ok(());
    }
    if config.get_int(section, "timeout_secs", 0) <= 0 {
        return Err(DashboardError::invalid(
            section,
            "timeout_secs",
            "timeout_secs must be a positive number of seconds",
        ));
    }
    Ok(())
}

fn validate_probability(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    let value = config.get_double("proxy", "probability", 0.5);
    if !(0.0..=1.0).contains(&value) {
        return Err(DashboardError::invalid(
            "proxy",
            "probability",
            "probability must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_scheme(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    match config.get_string("proxy", "scheme") {
        Some(s) if s.trim().is_empty() => Err(DashboardError::invalid(
            "proxy",
            "scheme",
            "scheme must not be empty",
        )),
        _ => Ok(()),
    }
}
