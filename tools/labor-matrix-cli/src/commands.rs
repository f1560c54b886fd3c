use crate::cli::{Cli, Commands, OutputFormat, PricingArgs};
use anyhow::{bail, Context, Result};
use colored::*;
use labor_rate_engine::{
    format_money, ChartMetric, ChartSeries, CurveDomain, EngineSettings, Evaluation,
    PricingConfig, PricingEngine, RateMatrix, RawPricingConfig, StoreBook, ValidationPolicy,
};
use std::io::{self, Write};
use tracing::{debug, info};

/// Store name used when no settings file declares one
const DEFAULT_STORE: &str = "default";

/// Settings from `--settings` (or the environment alone), with CLI policy applied.
pub fn load_settings(cli: &Cli) -> Result<EngineSettings> {
    let mut settings = match &cli.settings {
        Some(path) => EngineSettings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => EngineSettings::from_env().context("failed to read settings from environment")?,
    };
    if cli.permissive {
        settings.validation = ValidationPolicy::Permissive;
    }
    Ok(settings)
}

pub fn run(cli: Cli, settings: EngineSettings) -> Result<()> {
    let mut book = StoreBook::from_settings(&settings)?;
    info!(stores = book.len(), policy = ?book.policy(), "store book ready");

    let requested = cli.store.as_deref();
    match cli.command {
        Commands::Stores { hours } => list_stores(&book, hours)?,
        Commands::Quote { hours } => {
            let (store, config) = active_store(&mut book, requested, &cli.pricing)?;
            let evaluation = PricingEngine::evaluate(hours, &config)?;
            print_quote(&store, &evaluation)?;
        }
        Commands::Grid { format, view } => {
            let (store, config) = active_store(&mut book, requested, &cli.pricing)?;
            let matrix = RateMatrix::build(&config, settings.max_hour);
            match format {
                OutputFormat::Table => {
                    println!("{}", format!("{store} rate matrix").cyan().bold());
                    print!("{}", matrix.render_table(view.into())?);
                }
                OutputFormat::Csv => matrix.write_csv(io::stdout().lock(), view.into())?,
                OutputFormat::Json => println!("{}", matrix.to_json()?),
            }
        }
        Commands::Curve { format } => {
            let (store, config) = active_store(&mut book, requested, &cli.pricing)?;
            let series = ChartSeries::build(&config, CurveDomain::chart(settings.max_hour));
            print_curve(&store, &series, format)?;
        }
        Commands::Bounds { metric } => {
            let (store, config) = active_store(&mut book, requested, &cli.pricing)?;
            let series = ChartSeries::build(&config, CurveDomain::chart(settings.max_hour));
            let metric: ChartMetric = metric.into();
            match series.bounds(metric, settings.chart_padding_percent) {
                Some(bounds) => println!(
                    "{} {:?} axis: {} to {}",
                    store.cyan().bold(),
                    metric,
                    bounds.min,
                    bounds.max
                ),
                None => bail!("chart for '{store}' has no points"),
            }
        }
    }
    Ok(())
}

/// Resolve which store to price and apply inline overrides to it.
///
/// Overrides edit the store through the book, so a locked store rejects them.
/// Without any store in the book, overrides create a transient default store.
fn active_store(
    book: &mut StoreBook,
    requested: Option<&str>,
    overrides: &PricingArgs,
) -> Result<(String, PricingConfig)> {
    let name = match requested {
        Some(name) => name.to_string(),
        None => book
            .selected()
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| DEFAULT_STORE.to_string()),
    };

    if !overrides.is_empty() {
        match book.entry(&name) {
            Ok(entry) => {
                let raw = overrides.apply(entry.raw.clone());
                book.update(&name, raw)?;
            }
            Err(_) => {
                book.insert(&name, overrides.apply(RawPricingConfig::default()))?;
            }
        }
    } else if book.is_empty() {
        bail!("no stores configured; pass --settings or inline pricing such as --base-rate");
    }

    book.select(&name)?;
    let config = book.config(&name)?;
    debug!(store = %name, ?config, "pricing store");
    Ok((name, config))
}

fn print_quote(store: &str, evaluation: &Evaluation) -> Result<()> {
    let effective_rate = format_money(evaluation.effective_rate)?;
    let total = format_money(evaluation.total_amount)?;
    let elr = match evaluation.elr() {
        Some(elr) => format_money(elr)?,
        None => "N/A".to_string(),
    };

    println!("{}", format!("{store} quote").cyan().bold());
    println!("  Hours:           {}", evaluation.hours);
    println!("  Scaling factor:  {:.4}", evaluation.scaling_factor);
    println!("  Effective rate:  {effective_rate}");
    println!("  Total amount:    {}", total.green().bold());
    println!("  ELR:             {elr}");
    Ok(())
}

fn print_curve(store: &str, series: &ChartSeries, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", format!("{store} pricing curve").cyan().bold());
            println!(
                "{:>6}  {:>10}  {:>12}  {:>12}  {:>10}",
                "Hours", "ELR", "Total", "Standard", "Premium"
            );
            for point in &series.points {
                println!(
                    "{:>6.1}  {:>10}  {:>12}  {:>12}  {:>10}",
                    point.hours,
                    format_money(point.elr)?,
                    format_money(point.total_amount)?,
                    format_money(point.standard_amount)?,
                    format_money(point.premium(ChartMetric::TotalAmount, series.base_rate))?,
                );
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            for point in &series.points {
                writer.serialize(point)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(series)?),
    }
    Ok(())
}

fn list_stores(book: &StoreBook, hours: Option<f64>) -> Result<()> {
    if book.is_empty() {
        println!("{}", "No stores configured".yellow());
        return Ok(());
    }

    let selected = book.selected().map(|(name, _)| name);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", "Stores:".cyan().bold())?;
    for name in book.names() {
        let entry = book.entry(name)?;
        let lock = if entry.locked {
            format!("{:<8}", "locked").red()
        } else {
            format!("{:<8}", "open").green()
        };
        let marker = if selected == Some(name) { "*" } else { " " };
        writeln!(
            stdout,
            "{marker} {name:<20} {lock} base {} mode {:?}",
            format_money(entry.config.base_rate)?,
            entry.config.mode.kind()
        )?;
    }

    if let Some(hours) = hours {
        writeln!(stdout)?;
        writeln!(stdout, "{}", format!("Quotes for {hours} hours:").cyan().bold())?;
        for quote in book.quote_all(hours)? {
            writeln!(
                stdout,
                "  {:<20} {:>12}",
                quote.store,
                format_money(quote.evaluation.total_amount)?
            )?;
        }
    }
    Ok(())
}
