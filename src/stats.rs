//! Descriptive statistics, correlation and numeric summaries over tables

use ndarray::Array1;
use polars::prelude::{ChunkQuantile, NamedFrom, QuantileMethod, Series};

use crate::data::{Column, RowIndex, Table};
use crate::error::ClusterMakerError;

/// Row labels produced by [`describe`]
pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Column labels produced by [`summarise_numeric_columns`]
pub const SUMMARY_COLUMNS: [&str; 5] = ["mean", "std", "min", "max", "missing_values"];

/// Numeric columns as Float64 series, NaN mapped to null
fn numeric_series(data: &Table) -> crate::Result<Vec<(&str, Series)>> {
    let numeric: Vec<(&str, Series)> = data
        .numeric_columns()
        .into_iter()
        .map(|(name, values)| {
            let values: Vec<Option<f64>> =
                values.into_iter().map(|v| v.filter(|v| !v.is_nan())).collect();
            (name, Series::new(name.into(), values))
        })
        .collect();

    if numeric.is_empty() {
        return Err(ClusterMakerError::NoNumericColumns);
    }
    Ok(numeric)
}

fn observed(series: &Series) -> usize {
    series.len() - series.null_count()
}

/// Sample standard deviation (n - 1 denominator); undefined below two observations
fn sample_std(series: &Series) -> Option<f64> {
    if observed(series) < 2 {
        return None;
    }
    series.std(1)
}

fn quantile(series: &Series, q: f64) -> crate::Result<Option<f64>> {
    Ok(series.f64()?.quantile(q, QuantileMethod::Linear)?)
}

/// Pearson correlation over pairwise-complete observations
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let xs = Array1::from(xs);
    let ys = Array1::from(ys);
    let dx = &xs - xs.mean()?;
    let dy = &ys - ys.mean()?;

    let denominator = (dx.dot(&dx) * dy.dot(&dy)).sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some((dx.dot(&dy) / denominator).clamp(-1.0, 1.0))
}

/// Count, mean, std, min, quartiles and max for each numeric column
///
/// # Returns
/// * Table indexed by statistic name with one column per numeric input column
pub fn describe(data: &Table) -> crate::Result<Table> {
    let columns = numeric_series(data)?
        .into_iter()
        .map(|(name, series)| {
            let stats = vec![
                Some(observed(&series) as f64),
                series.mean(),
                sample_std(&series),
                series.min::<f64>()?,
                quantile(&series, 0.25)?,
                quantile(&series, 0.50)?,
                quantile(&series, 0.75)?,
                series.max::<f64>()?,
            ];
            Ok((name.to_string(), Column::Float(stats)))
        })
        .collect::<crate::Result<Vec<_>>>()?;

    Table::new(columns)?.with_index(RowIndex::new(None, DESCRIBE_ROWS))
}

/// Pearson correlation matrix across numeric columns
pub fn correlation(data: &Table) -> crate::Result<Table> {
    let numeric = data.numeric_columns();
    if numeric.is_empty() {
        return Err(ClusterMakerError::NoNumericColumns);
    }
    let names: Vec<&str> = numeric.iter().map(|(name, _)| *name).collect();

    let columns = numeric
        .iter()
        .map(|(name, x)| {
            let values = numeric.iter().map(|(_, y)| pearson(x, y)).collect();
            (name.to_string(), Column::Float(values))
        })
        .collect();

    Table::new(columns)?.with_index(RowIndex::new(None, names))
}

/// Mean, std, min, max and missing-value count of every numeric column
///
/// Text columns are ignored; the skipped names are reported at `info` level.
///
/// # Returns
/// * Table indexed by column name with columns `mean`, `std`, `min`, `max`, `missing_values`
pub fn summarise_numeric_columns(data: &Table) -> crate::Result<Table> {
    let numeric = numeric_series(data)?;

    let ignored = data.non_numeric_column_names();
    if !ignored.is_empty() {
        tracing::info!(?ignored, "ignoring non-numeric columns");
    }

    let mut means = Vec::with_capacity(numeric.len());
    let mut stds = Vec::with_capacity(numeric.len());
    let mut mins = Vec::with_capacity(numeric.len());
    let mut maxs = Vec::with_capacity(numeric.len());
    let mut missing = Vec::with_capacity(numeric.len());

    for (_, series) in &numeric {
        means.push(series.mean());
        stds.push(sample_std(series));
        mins.push(series.min::<f64>()?);
        maxs.push(series.max::<f64>()?);
        missing.push(Some(series.null_count() as i64));
    }

    let names: Vec<&str> = numeric.iter().map(|(name, _)| *name).collect();
    let columns = SUMMARY_COLUMNS
        .iter()
        .map(|label| label.to_string())
        .zip([
            Column::Float(means),
            Column::Float(stds),
            Column::Float(mins),
            Column::Float(maxs),
            Column::Integer(missing),
        ])
        .collect();

    Table::new(columns)?.with_index(RowIndex::new(None, names))
}
