//! A set of weather records together with the columns its schema carries

use serde::{Deserialize, Serialize};

use super::{Column, WeatherRecord};

/// Weather records plus the columns present in their source schema.
///
/// The column list decides which features can be selected and whether a
/// rain label was supplied; values inside a present column may still be
/// missing per record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherDataset {
    columns: Vec<Column>,
    pub records: Vec<WeatherRecord>,
}

impl WeatherDataset {
    /// Create a dataset. Duplicate columns are collapsed and the rest kept in
    /// canonical schema order.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = Column>, records: Vec<WeatherRecord>) -> Self {
        let mut dataset = Self {
            columns: Vec::new(),
            records,
        };
        for column in columns {
            dataset.add_column(column);
        }
        dataset
    }

    /// Dataset with the full schema of a live fetch
    #[must_use]
    pub fn from_fetch(records: Vec<WeatherRecord>) -> Self {
        Self::new(Column::FETCH_SCHEMA, records)
    }

    /// Columns present, in canonical order
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Register a column in the schema. Returns false if it was already present.
    pub fn add_column(&mut self, column: Column) -> bool {
        if self.has_column(column) {
            return false;
        }
        let position = self
            .columns
            .iter()
            .position(|c| *c > column)
            .unwrap_or(self.columns.len());
        self.columns.insert(position, column);
        true
    }

    /// Numeric columns present, in canonical order
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<Column> {
        self.columns.iter().copied().filter(|c| c.is_numeric()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeatherRecord> {
        self.records.iter()
    }

    /// Copy of this dataset holding only the records matching `predicate`
    #[must_use]
    pub fn filtered<F>(&self, predicate: F) -> Self
    where
        F: Fn(&WeatherRecord) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }
}
