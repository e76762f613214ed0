//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset, Local};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_page_adapter::HtmlPageAdapter;
use crate::adapters::html_table_adapter::HtmlTableAdapter;
use crate::adapters::proxy_list_adapter::selector_from_config;
use crate::adapters::yahoo_adapter::YahooAdapter;
use crate::domain::config_validation::{PROVIDER_SOURCES, validate_config};
use crate::domain::error::DashboardError;
use crate::domain::fetch::Fetcher;
use crate::domain::indicator::{Indicator, MAX_OVERLAY_SPAN, MIN_OVERLAY_SPAN};
use crate::domain::info::info_table;
use crate::domain::overview::{Exchange, OverviewOptions, TOP_MOVERS, movers_table};
use crate::domain::page::{Page, render_page};
use crate::domain::period::{Interval, Period};
use crate::domain::session::SessionState;
use crate::domain::settings::DashboardSettings;
use crate::domain::table::Table;
use crate::ports::config_port::ConfigPort;
use crate::ports::page_port::PagePort;

#[derive(Parser, Debug)]
#[command(name = "marketdash", about = "Stock market dashboard generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the dashboard to an HTML file
    Dashboard {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        overrides: DashboardArgs,
    },
    /// Show the summary table of one security
    Info {
        #[arg(long)]
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the top gainers and losers of an exchange
    Movers {
        #[arg(long)]
        exchange: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        listen: Option<String>,
    },
    /// Validate a configuration file
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line overrides of the `[dashboard]` section.
#[derive(Args, Debug, Default, Clone)]
pub struct DashboardArgs {
    /// Comma-separated ticker symbols
    #[arg(long)]
    pub tickers: Option<String>,
    #[arg(long)]
    pub period: Option<String>,
    #[arg(long)]
    pub interval: Option<String>,
    /// Comma-separated indicator names, e.g. "SMA_20,RSI"
    #[arg(long)]
    pub indicators: Option<String>,
    #[arg(long)]
    pub overlay_span: Option<usize>,
    /// Leave the simple moving average off the overlay chart
    #[arg(long)]
    pub no_overlay_sma: bool,
    /// Leave the exponential moving average off the overlay chart
    #[arg(long)]
    pub no_overlay_ema: bool,
    #[arg(long)]
    pub no_volume: bool,
    #[arg(long)]
    pub dark: bool,
    /// Skip the global indices and top movers sections
    #[arg(long)]
    pub no_overview: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Dashboard {
            config,
            output,
            overrides,
        } => run_dashboard(config.as_ref(), output.as_ref(), &overrides),
        Command::Info { ticker, config } => run_info(&ticker, config.as_ref()),
        Command::Movers { exchange, config } => run_movers(exchange.as_deref(), config.as_ref()),
        Command::Serve { config, listen } => run_serve(config.as_ref(), listen.as_deref()),
        Command::CheckConfig { config } => run_check_config(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Loads `path` when given; an empty configuration otherwise.
fn load_optional_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Builds the fetcher for `[provider] source` with the `[proxy]` selector.
pub fn build_fetcher(config: &dyn ConfigPort) -> Result<Fetcher, DashboardError> {
    let proxies = selector_from_config(config)?;
    let source = config
        .get_string("provider", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| PROVIDER_SOURCES[0].to_string());

    match source.as_str() {
        "yahoo" => Ok(Fetcher::new(
            Box::new(YahooAdapter::from_config(config)?),
            Box::new(HtmlTableAdapter::from_config(config)?),
            proxies,
        )),
        "csv" => Ok(Fetcher::new(
            Box::new(CsvAdapter::from_config(config)?),
            Box::new(CsvAdapter::from_config(config)?),
            proxies,
        )),
        other => Err(DashboardError::invalid(
            "provider",
            "source",
            format!("unknown source {other} (expected one of {})", PROVIDER_SOURCES.join(", ")),
        )),
    }
}

fn input_error(reason: impl Into<String>) -> DashboardError {
    DashboardError::InvalidInput {
        reason: reason.into(),
    }
}

/// Applies command-line overrides on top of the configured settings.
///
/// A new period without an interval drops the configured interval so the
/// period's default applies.
pub fn apply_overrides(
    settings: &mut DashboardSettings,
    args: &DashboardArgs,
) -> Result<(), DashboardError> {
    let input = &mut settings.input;

    if let Some(tickers) = &args.tickers {
        input.tickers = Some(tickers.clone());
    }
    if let Some(period) = &args.period {
        input.period = period.parse::<Period>().map_err(input_error)?;
        input.interval = None;
    }
    if let Some(interval) = &args.interval {
        input.interval = Some(interval.parse::<Interval>().map_err(input_error)?);
    }
    if let Some(names) = &args.indicators {
        input.indicators = names
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let indicator = s.parse::<Indicator>().map_err(input_error)?;
                if !indicator.is_selectable() {
                    return Err(input_error(format!("indicator {s} cannot be selected")));
                }
                Ok(indicator)
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(span) = args.overlay_span {
        if !(MIN_OVERLAY_SPAN..=MAX_OVERLAY_SPAN).contains(&span) {
            return Err(input_error(format!(
                "overlay span must be between {MIN_OVERLAY_SPAN} and {MAX_OVERLAY_SPAN}"
            )));
        }
        input.overlay_span = Some(span);
    }
    if args.no_overlay_sma {
        input.overlay_averages.sma = false;
    }
    if args.no_overlay_ema {
        input.overlay_averages.ema = false;
    }
    if args.no_volume {
        input.volume = false;
    }
    if args.dark {
        input.dark_mode = Some(true);
    }
    if args.no_overview {
        settings.overview = OverviewOptions::disabled();
    }
    Ok(())
}

/// Configured settings with overrides applied, after validating the config.
pub fn build_settings(
    config: &dyn ConfigPort,
    args: &DashboardArgs,
) -> Result<DashboardSettings, DashboardError> {
    validate_config(config)?;
    let mut settings = DashboardSettings::from_config(config)?;
    apply_overrides(&mut settings, args)?;
    Ok(settings)
}

/// One render of the dashboard with a fresh session.
pub fn generate_page(fetcher: &Fetcher, settings: &DashboardSettings) -> Page {
    let now = now();
    let mut session = SessionState::new(now);
    render_page(fetcher, &mut session, &settings.input, &settings.overview, now)
}

fn run_dashboard(
    config_path: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    overrides: &DashboardArgs,
) -> ExitCode {
    // Stage 1: Load config
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 2: Settings and overrides
    let settings = match build_settings(&config, overrides) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Fetcher
    let fetcher = match build_fetcher(&config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Render
    eprintln!("Rendering dashboard ({}, {})", settings.input.period, describe_interval(&settings));
    let page = generate_page(&fetcher, &settings);
    for notice in page.all_notices() {
        eprintln!("{}: {}", notice.level.as_str(), notice.message);
    }

    // Stage 5: Write
    let output = output_path.unwrap_or(&settings.output);
    let Some(output_str) = output.to_str() else {
        let err = input_error(format!("output path is not valid UTF-8: {}", output.display()));
        eprintln!("error: {err}");
        return (&err).into();
    };
    if let Err(e) = HtmlPageAdapter::new().write(&page, output_str) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "Wrote {} charts for {} ticker(s) to {}",
        page.charts().count(),
        page.tickers.len(),
        output.display()
    );
    ExitCode::SUCCESS
}

fn describe_interval(settings: &DashboardSettings) -> String {
    settings
        .input
        .interval
        .map(|i| i.to_string())
        .unwrap_or_else(|| Interval::default_for(settings.input.period).to_string())
}

/// Rows of `table` padded to their column widths.
pub fn format_table(table: &Table) -> Vec<String> {
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in table.rows() {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(line(table.columns()))
        .chain(table.rows().iter().map(|row| line(row.as_slice())))
        .collect()
}

fn run_info(ticker: &str, config_path: Option<&PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let fetcher = match build_fetcher(&config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let info = fetcher.fetch_info(ticker.trim());
    let info = match info.as_ref() {
        Ok(info) => info,
        Err(e) => {
            let err = DashboardError::from(e.clone());
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let display = info_table(info);
    if display.is_empty() {
        let err = DashboardError::NoData {
            ticker: ticker.to_string(),
        };
        eprintln!(
            "error: {err} (quote type {} has no summary)",
            info.quote_type_tag()
        );
        return (&err).into();
    }

    for line in format_table(&display.to_table()) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}

fn run_movers(exchange: Option<&str>, config_path: Option<&PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let exchanges = match exchange {
        Some(name) => match name.parse::<Exchange>() {
            Ok(e) => vec![e],
            Err(reason) => {
                let err = input_error(reason);
                eprintln!("error: {err}");
                return (&err).into();
            }
        },
        None => match DashboardSettings::from_config(&config) {
            Ok(s) => s.overview.exchanges,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    let fetcher = match build_fetcher(&config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut status = ExitCode::SUCCESS;
    for exchange in exchanges {
        let urls = [
            ("Gainers", exchange.gainers_url()),
            ("Losers", exchange.losers_url()),
        ];
        for (label, url) in urls {
            println!("\nTop {} {} ({})", TOP_MOVERS, label, exchange);
            let table = fetcher.fetch_table(url);
            match table.as_ref() {
                Err(e) => {
                    let err = DashboardError::from(e.clone());
                    eprintln!("error: {err}");
                    status = (&err).into();
                }
                Ok(raw) => match movers_table(raw, exchange) {
                    Some(movers) if !movers.is_empty() => {
                        for line in format_table(&movers) {
                            println!("{line}");
                        }
                    }
                    Some(_) => eprintln!("No {} data for {}.", label.to_lowercase(), exchange),
                    None => eprintln!("Unexpected table layout at {}", url),
                },
            }
        }
    }
    status
}

fn run_serve(config_path: Option<&PathBuf>, listen: Option<&str>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, DEFAULT_LISTEN, build_router};
        use std::net::SocketAddr;

        let config = match load_optional_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let defaults = match build_settings(&config, &DashboardArgs::default()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let fetcher = match build_fetcher(&config) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let listen = listen
            .map(str::to_string)
            .or_else(|| config.get_string("web", "listen"))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr: SocketAddr = match listen.trim().parse() {
            Ok(a) => a,
            Err(_) => {
                let err =
                    DashboardError::invalid("web", "listen", format!("invalid address {listen}"));
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        eprintln!("Starting web server on {}", addr);

        let router = build_router(AppState::new(fetcher, defaults));

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(1);
            }
        };

        let served = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let err = DashboardError::Io(e);
                eprintln!("error: {err}");
                (&err).into()
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config_path, listen);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_check_config(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_settings(&config, &DashboardArgs::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = build_fetcher(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let input = &settings.input;
    eprintln!("\nDashboard:");
    eprintln!(
        "  Tickers:    {}",
        input.tickers.as_deref().unwrap_or(crate::domain::session::DEFAULT_TICKERS)
    );
    eprintln!("  Period:     {}", input.period);
    eprintln!("  Interval:   {}", describe_interval(&settings));
    if !input.indicators.is_empty() {
        let names: Vec<String> = input.indicators.iter().map(Indicator::to_string).collect();
        eprintln!("  Indicators: {}", names.join(", "));
    }
    if let Some(span) = input.overlay_span {
        eprintln!("  Overlay:    {} periods", span);
    }
    let exchanges: Vec<String> = settings
        .overview
        .exchanges
        .iter()
        .map(Exchange::to_string)
        .collect();
    eprintln!("  Exchanges:  {}", exchanges.join(", "));
    eprintln!("  Output:     {}", settings.output.display());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
