//! CSV reading and writing of normalized weather datasets

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{Column, RainLabel, WeatherDataset, WeatherRecord};
use crate::pipeline::column_value;
use crate::{Result, WeatherInsightsError};

/// Timestamp layout written to CSV files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a UTC timestamp cell. Unparsable cells yield `None`.
#[must_use]
pub fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(cell, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

fn parse_offset(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| parse_number(cell).filter(|v| v.is_finite()).map(|v| v as i64))
}

fn non_empty(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}

/// Store one CSV cell on the record field behind `column`
fn set_cell(record: &mut WeatherRecord, column: Column, cell: &str, row: usize) {
    match column {
        Column::City => record.city = cell.trim().to_string(),
        Column::Temperature => record.temperature = parse_number(cell),
        Column::FeelsLike => record.feels_like = parse_number(cell),
        Column::Humidity => record.humidity = parse_number(cell),
        Column::Pressure => record.pressure = parse_number(cell),
        Column::WindSpeed => record.wind_speed = parse_number(cell),
        Column::Cloudiness => record.cloudiness = parse_number(cell),
        Column::Visibility => record.visibility = parse_number(cell),
        Column::Weather => record.weather = non_empty(cell),
        Column::Sunrise => record.sunrise = parse_timestamp(cell),
        Column::Sunset => record.sunset = parse_timestamp(cell),
        Column::Timezone => record.timezone = parse_offset(cell),
        Column::Rain => {
            record.rain = RainLabel::parse(cell);
            if record.rain.is_none() && !cell.trim().is_empty() {
                warn!("Row {}: unrecognised Rain value '{}'", row, cell.trim());
            }
        }
        // Kept as a fallback; recomputed whenever the inputs are present
        Column::ComfortIndex
        | Column::SeverityIndex
        | Column::DaylightHours
        | Column::SunriseHour
        | Column::SunsetHour => {
            if let Some(value) = parse_number(cell) {
                record.supplied.insert(column, value);
            }
        }
    }
}

/// Read a dataset from CSV. The header decides the schema; unknown columns
/// are ignored and empty or malformed cells become missing values.
pub fn read_csv<R: Read>(reader: R) -> Result<WeatherDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mapping: Vec<Option<Column>> = headers.iter().map(Column::from_name).collect();

    let ignored: Vec<&str> = headers
        .iter()
        .zip(&mapping)
        .filter_map(|(name, column)| column.is_none().then_some(name))
        .collect();
    if !ignored.is_empty() {
        debug!("Ignoring unknown columns: {:?}", ignored);
    }

    let columns: Vec<Column> = mapping.iter().flatten().copied().collect();
    if columns.is_empty() {
        return Err(WeatherInsightsError::data(
            "CSV header does not contain any known weather column",
        ));
    }

    let mut records = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let line = result?;
        let mut record = WeatherRecord::default();
        for (cell, column) in line.iter().zip(&mapping) {
            if let Some(column) = column {
                set_cell(&mut record, *column, cell, row + 1);
            }
        }
        records.push(record);
    }

    let dataset = WeatherDataset::new(columns, records);
    info!(
        "Loaded {} rows and {} columns",
        dataset.len(),
        dataset.columns().len()
    );
    Ok(dataset)
}

/// Read a dataset from a CSV file
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<WeatherDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        WeatherInsightsError::data(format!("Cannot open {}: {}", path.display(), e))
    })?;
    read_csv(file)
}

fn format_cell(record: &WeatherRecord, column: Column) -> String {
    match column {
        Column::City => record.city.clone(),
        Column::Weather => record.weather.clone().unwrap_or_default(),
        Column::Sunrise => format_timestamp(record.sunrise),
        Column::Sunset => format_timestamp(record.sunset),
        Column::Timezone => record.timezone.map(|tz| tz.to_string()).unwrap_or_default(),
        Column::Rain => record
            .rain
            .map(|r| r.as_u8().to_string())
            .unwrap_or_default(),
        numeric => column_value(record, numeric)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Write the dataset as CSV, one column per schema column
pub fn write_csv_to<W: Write>(dataset: &WeatherDataset, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.columns().iter().map(|c| c.name()))?;

    for record in dataset.iter() {
        csv_writer.write_record(dataset.columns().iter().map(|&c| format_cell(record, c)))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the dataset to a CSV file
pub fn write_csv<P: AsRef<Path>>(dataset: &WeatherDataset, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv_to(dataset, file)?;
    info!("Wrote {} rows to {}", dataset.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    const SAMPLE: &str = "\
City,Temperature,Feels Like,Humidity,Pressure,Wind Speed,Cloudiness (%),Visibility (km),Weather,Sunrise (UTC),Sunset (UTC),Timezone,Dew Point
Delhi,31,35,52,1004,11,20,4.5,Haze,2024-05-01 00:12:00,2024-05-01 13:20:30,19800,12
London,12,10,81,1015,22,,10.0,Light rain,2024-05-01T04:33:00Z,not a date,3600.0,7
";

    #[test]
    fn test_read_csv_schema_and_values() {
        let dataset = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.has_column(Column::Timezone));
        assert!(!dataset.has_column(Column::Rain));

        let delhi = &dataset.records[0];
        assert_eq!(delhi.city, "Delhi");
        assert_eq!(delhi.visibility, Some(4.5));
        assert_eq!(delhi.timezone, Some(19800));
        assert_eq!(delhi.sunset.unwrap().second(), 30);

        let london = &dataset.records[1];
        assert_eq!(london.cloudiness, None);
        assert_eq!(london.timezone, Some(3600));
        assert_eq!(
            london.sunrise,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 4, 33, 0).unwrap())
        );
        assert_eq!(london.sunset, None);
    }

    #[test]
    fn test_read_csv_rain_column() {
        let csv = "City,Humidity,Rain\nA,10,1\nB,20,\nC,30,false\n";
        let dataset = read_csv(csv.as_bytes()).unwrap();
        assert!(dataset.has_column(Column::Rain));
        let labels: Vec<_> = dataset.iter().map(|r| r.rain).collect();
        assert_eq!(
            labels,
            vec![Some(RainLabel::Rain), None, Some(RainLabel::NoRain)]
        );
    }

    #[test]
    fn test_header_without_known_columns() {
        let err = read_csv("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WeatherInsightsError::Data { .. }));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01 00:12:00").is_some());
        assert!(parse_timestamp("2024-05-01T00:12:00").is_some());
        assert!(parse_timestamp("2024-05-01T00:12:00+02:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_written_csv_reads_back() {
        let dataset = read_csv(SAMPLE.as_bytes()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_csv_to(&dataset, file.as_file_mut()).unwrap();

        let reread = load_csv(file.path()).unwrap();
        assert_eq!(reread.columns(), dataset.columns());
        assert_eq!(reread.records, dataset.records);
    }

    #[test]
    fn test_derived_cells_are_kept() {
        let csv = "City,Humidity,Comfort Index,Daylight Duration (hrs)\nA,80,97.5,12.5\nB,40,,10.0\n";
        let dataset = read_csv(csv.as_bytes()).unwrap();
        assert!(dataset.has_column(Column::ComfortIndex));

        let a = &dataset.records[0];
        assert_eq!(a.supplied.get(&Column::ComfortIndex), Some(&97.5));
        assert_eq!(column_value(a, Column::DaylightHours), Some(12.5));
        assert_eq!(column_value(&dataset.records[1], Column::ComfortIndex), None);
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("Cannot open"));
    }
}
