//! Command line interface for weather collection, rain model training and
//! dataset analysis

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use weather_insights::analysis::{
    ColumnSummary, city_averages, compare_cities, correlation_matrix, describe, predict_cities,
    select_cities, unique_cities, weather_condition_frequency,
};
use weather_insights::pipeline::{add_derived_columns, derive_metrics};
use weather_insights::{
    AppConfig, OpenWeatherClient, WeatherDataset, collect_weather, load_csv, logging, normalize,
    prepare, train_rain_classifier, write_csv,
};

#[derive(Parser)]
#[command(name = "weather-insights")]
#[command(version, about = "City weather features and rain prediction", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current weather for the configured cities
    Fetch {
        /// Write the normalized dataset to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train the rain classifier on a CSV dataset
    Train {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// City to predict rain for (repeatable)
        #[arg(long = "city")]
        cities: Vec<String>,
    },

    /// Print summary statistics and aggregates of a CSV dataset
    Analyze {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// City to include (repeatable, defaults to the first cities)
        #[arg(long = "city")]
        cities: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(cli.config.as_deref())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Fetch { output } => fetch(&config, output.as_deref()),
        Commands::Train { input, cities } => train(&config, &input, &cities),
        Commands::Analyze { input, cities } => analyze(&config, &input, &cities),
    }
}

fn fetch(config: &AppConfig, output: Option<&Path>) -> Result<()> {
    let api_key = config
        .weather
        .resolve_api_key()
        .context("A weather API key is required to fetch data")?;
    let client = OpenWeatherClient::new(&config.weather, api_key)?;

    let raw = collect_weather(&client, &config.weather.cities);
    let records = normalize(&raw, config.pipeline.missing_fields);
    let mut dataset = WeatherDataset::from_fetch(records);
    add_derived_columns(&mut dataset);

    if let Some(path) = output {
        write_csv(&dataset, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} records to {}", dataset.len(), path.display());
        return Ok(());
    }

    println!(
        "{:<16} {:>6} {:>6} {:>9} {:>8}  {}",
        "City", "Temp", "Feels", "Humidity", "Comfort", "Weather"
    );
    println!("{}", "-".repeat(72));
    for record in dataset.iter() {
        let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.0}"));
        println!(
            "{:<16} {:>6} {:>6} {:>9} {:>8}  {}",
            record.city,
            cell(record.temperature),
            cell(record.feels_like),
            cell(record.humidity),
            cell(derive_metrics(record).comfort_index),
            record.weather.as_deref().unwrap_or("-")
        );
    }
    println!("\nFetched {} of {} cities", dataset.len(), config.weather.cities.len());
    Ok(())
}

fn train(config: &AppConfig, input: &Path, cities: &[String]) -> Result<()> {
    let dataset =
        load_csv(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let (prepared, matrix) = prepare(
        &dataset,
        &config.pipeline.feature_names,
        config.pipeline.feature_mode,
    )?;
    if matrix.n_features() == 0 {
        bail!(
            "None of the configured features are present in {}",
            input.display()
        );
    }

    let (model, metrics) = train_rain_classifier(
        &matrix.rows,
        &matrix.targets,
        config.model.test_fraction,
        config.model.seed,
        &config.model.params,
    )
    .context("Training the rain classifier failed")?;

    println!(
        "Model trained successfully! Accuracy: {:.2}%",
        metrics.accuracy * 100.0
    );
    println!("\nClassification Report:\n{}", metrics.report);

    if cities.is_empty() {
        return Ok(());
    }

    let selected = select_cities(&prepared, cities, config.pipeline.max_selected_cities)?;
    if selected.is_empty() {
        warn!("None of the selected cities occur in {}", input.display());
        return Ok(());
    }

    let table = predict_cities(&model, &prepared, &matrix, cities)?;
    println!("City-wise Rain Prediction Results:");
    print!("{:<16}", "City");
    for name in &table.feature_names {
        print!(" {name:>14}");
    }
    println!(" {:>10}", "Predicted");
    for prediction in &table.predictions {
        print!("{:<16}", prediction.city);
        for value in &prediction.features {
            print!(" {value:>14.2}");
        }
        println!(" {:>10}", prediction.predicted.to_string());
    }

    println!("\nAverage Weather Parameters for Selected Cities:\n{}", table.averages);
    Ok(())
}

fn print_summary(summary: &[ColumnSummary]) {
    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    println!(
        "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summary {
        println!(
            "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            s.column.name(),
            s.count,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.q25),
            cell(s.median),
            cell(s.q75),
            cell(s.max)
        );
    }
}

fn analyze(config: &AppConfig, input: &Path, cities: &[String]) -> Result<()> {
    let dataset =
        load_csv(input).with_context(|| format!("Failed to load {}", input.display()))?;

    let max_cities = config.pipeline.max_selected_cities;
    let cities: Vec<String> = if cities.is_empty() {
        unique_cities(&dataset).into_iter().take(max_cities).collect()
    } else {
        cities.to_vec()
    };
    let mut dataset = select_cities(&dataset, &cities, max_cities)?;
    add_derived_columns(&mut dataset);
    let numeric = dataset.numeric_columns();

    println!("Analyzing: {}\n", cities.join(", "));
    println!("Summary Statistics:");
    print_summary(&describe(&dataset, &numeric));

    println!("\nWeather Condition Frequency:");
    for condition in weather_condition_frequency(&dataset) {
        println!("{:<28} {:>5}", condition.weather, condition.count);
    }

    println!("\nAverages by City:\n{}", city_averages(&dataset, &numeric));
    println!("Correlation:\n{}", correlation_matrix(&dataset, &numeric));

    if let [a, b] = cities.as_slice() {
        let comparison = compare_cities(&dataset, a, b, &numeric)?;
        println!("Comparison of {a} and {b}:\n{}", comparison.per_city);
        for (column, value) in comparison.columns.iter().zip(&comparison.combined) {
            match value {
                Some(v) => println!("{column:<24} {v:>10.2}"),
                None => println!("{column:<24} {:>10}", "-"),
            }
        }
    }

    Ok(())
}
