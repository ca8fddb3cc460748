//! Rectangular tables with named, typed columns and CSV loading using Polars

use std::collections::HashSet;
use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, DataType, IntoColumn, NamedFrom, SerReader, Series};

use crate::error::ClusterMakerError;

/// A single table column; `None` marks a missing value
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<Option<f64>>),
    Integer(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    /// Build a float column without missing values
    pub fn from_f64(values: impl IntoIterator<Item = f64>) -> Self {
        Column::Float(values.into_iter().map(Some).collect())
    }

    /// Build an integer column without missing values
    pub fn from_i64(values: impl IntoIterator<Item = i64>) -> Self {
        Column::Integer(values.into_iter().map(Some).collect())
    }

    /// Build a text column without missing values
    pub fn from_text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Column::Text(values.into_iter().map(|v| Some(v.into())).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Float(values) => values.len(),
            Column::Integer(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Column::Text(_))
    }

    /// Values widened to `f64`, or `None` for a text column
    pub fn to_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Column::Float(values) => Some(values.clone()),
            Column::Integer(values) => Some(values.iter().map(|v| v.map(|v| v as f64)).collect()),
            Column::Text(_) => None,
        }
    }

    /// Polars series of this column; NaN floats become nulls
    pub fn to_series(&self, name: &str) -> Series {
        match self {
            Column::Float(values) => {
                let values: Vec<Option<f64>> =
                    values.iter().map(|v| v.filter(|v| !v.is_nan())).collect();
                Series::new(name.into(), values)
            }
            Column::Integer(values) => Series::new(name.into(), values),
            Column::Text(values) => Series::new(name.into(), values),
        }
    }

    /// Number of missing entries
    pub fn missing_count(&self) -> usize {
        match self {
            Column::Float(values) => values.iter().filter(|v| v.map_or(true, f64::is_nan)).count(),
            Column::Integer(values) => values.iter().filter(|v| v.is_none()).count(),
            Column::Text(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }
}

/// Labelled row axis
#[derive(Debug, Clone, PartialEq)]
pub struct RowIndex {
    pub name: Option<String>,
    pub labels: Vec<String>,
}

impl RowIndex {
    pub fn new<S: Into<String>>(name: Option<&str>, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.map(str::to_string),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Positional labels `0..n`
    pub fn positional(name: Option<&str>, n: usize) -> Self {
        Self::new(name, (0..n).map(|i| i.to_string()))
    }
}

/// Rectangular table: ordered named columns sharing one row count
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index: Option<RowIndex>,
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Table {
    /// Create a table, checking that column names are unique and all columns have equal length
    pub fn new(columns: Vec<(String, Column)>) -> crate::Result<Self> {
        let n_rows = columns.first().map_or(0, |(_, column)| column.len());

        let mut seen = HashSet::new();
        for (name, column) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ClusterMakerError::usage(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
            if column.len() != n_rows {
                return Err(ClusterMakerError::usage(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    n_rows
                )));
            }
        }

        Ok(Self {
            index: None,
            columns,
            n_rows,
        })
    }

    /// Attach a row index; its length must match the row count
    pub fn with_index(mut self, index: RowIndex) -> crate::Result<Self> {
        if index.labels.len() != self.n_rows {
            return Err(ClusterMakerError::usage(format!(
                "index has {} labels but the table has {} rows",
                index.labels.len(),
                self.n_rows
            )));
        }
        self.index = Some(index);
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn index(&self) -> Option<&RowIndex> {
        self.index.as_ref()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, column)| column)
    }

    /// Row labels: the attached index, or positions when there is none
    pub fn row_labels(&self) -> Vec<String> {
        match &self.index {
            Some(index) => index.labels.clone(),
            None => (0..self.n_rows).map(|i| i.to_string()).collect(),
        }
    }

    /// Numeric columns widened to `f64`, in column order
    pub fn numeric_columns(&self) -> Vec<(&str, Vec<Option<f64>>)> {
        self.columns()
            .filter_map(|(name, column)| column.to_f64().map(|values| (name, values)))
            .collect()
    }

    /// Convert to a Polars frame, optionally with the row labels as a leading column
    pub fn to_dataframe(&self, include_index: bool) -> crate::Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.n_columns() + 1);
        if include_index {
            let name = self
                .index
                .as_ref()
                .and_then(|index| index.name.clone())
                .unwrap_or_default();
            columns.push(Series::new(name.as_str().into(), self.row_labels()).into_column());
        }
        columns.extend(
            self.columns()
                .map(|(name, column)| column.to_series(name).into_column()),
        );
        Ok(DataFrame::new(columns)?)
    }

    /// Names of columns that hold text
    pub fn non_numeric_column_names(&self) -> Vec<&str> {
        self.columns()
            .filter(|(_, column)| !column.is_numeric())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Load a CSV file with a header row
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// # Returns
/// * `Table` with integer, float and text columns as inferred by the reader
pub fn read_csv(file_path: impl AsRef<Path>) -> crate::Result<Table> {
    let file_path = file_path.as_ref();
    if !file_path.is_file() {
        return Err(ClusterMakerError::FileNotFound(file_path.to_path_buf()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;

    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            Ok((series.name().to_string(), convert_series(series)?))
        })
        .collect::<crate::Result<Vec<_>>>()?;

    let table = Table::new(columns)?;
    tracing::debug!(
        path = %file_path.display(),
        rows = table.n_rows(),
        columns = table.n_columns(),
        "loaded csv"
    );
    Ok(table)
}

fn convert_series(series: &Series) -> crate::Result<Column> {
    // A column with no values at all is numeric with every entry missing
    let all_missing = !series.is_empty() && series.null_count() == series.len();
    if all_missing || matches!(series.dtype(), DataType::Null) {
        return Ok(Column::Float(vec![None; series.len()]));
    }

    let column = match series.dtype() {
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
            Column::Integer(series.cast(&DataType::Int64)?.i64()?.into_iter().collect())
        }
        DataType::Float32 | DataType::Float64 => {
            Column::Float(series.cast(&DataType::Float64)?.f64()?.into_iter().collect())
        }
        _ => Column::Text(
            series
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .map(|value| value.map(str::to_string))
                .collect(),
        ),
    };
    Ok(column)
}
