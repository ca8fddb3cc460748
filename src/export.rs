//! Export tables to delimited CSV and fixed-width text

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::{CsvWriter, SerWriter};

use crate::data::{Column, Table};
use crate::error::ClusterMakerError;

/// Most decimals shown for a float in the text rendering
const MAX_TEXT_DECIMALS: usize = 6;

/// Options for [`export_to_csv`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: char,
    pub include_index: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_index: false,
        }
    }
}

impl CsvOptions {
    /// Delimiter as the single byte Polars writes between fields
    fn separator(&self) -> crate::Result<u8> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(ClusterMakerError::usage(format!(
                "{:?} cannot be used as a CSV delimiter",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }
}

/// Fail with `DirectoryNotFound` when the parent directory of `path` does not exist
fn ensure_parent_dir(path: &Path) -> crate::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ClusterMakerError::DirectoryNotFound(parent.to_path_buf()))
        }
        _ => Ok(()),
    }
}

fn create_file(path: &Path) -> crate::Result<BufWriter<File>> {
    ensure_parent_dir(path)?;
    Ok(BufWriter::new(File::create(path)?))
}

/// Write `data` as delimited text to any writer
pub fn write_csv<W: Write>(data: &Table, writer: &mut W, options: &CsvOptions) -> crate::Result<()> {
    let separator = options.separator()?;
    let mut df = data.to_dataframe(options.include_index)?;

    // Polars quotes an empty header cell as `""`; an unnamed index keeps a bare empty cell
    let unnamed_index = options.include_index
        && data
            .index()
            .and_then(|index| index.name.as_deref())
            .map_or(true, str::is_empty);
    if unnamed_index {
        writer.write_all(&[separator])?;
        let mut header = data.to_dataframe(false)?.clear();
        CsvWriter::new(&mut *writer)
            .with_separator(separator)
            .finish(&mut header)?;
    }

    CsvWriter::new(&mut *writer)
        .include_header(!unnamed_index)
        .with_separator(separator)
        .finish(&mut df)?;
    writer.flush()?;
    Ok(())
}

/// Export a table to a CSV file
///
/// # Arguments
/// * `data` - Table to export
/// * `filename` - Output path; its directory must exist
/// * `options` - Delimiter and whether to write the row index
pub fn export_to_csv(data: &Table, filename: impl AsRef<Path>, options: &CsvOptions) -> crate::Result<()> {
    let filename = filename.as_ref();
    let mut writer = create_file(filename)?;
    write_csv(data, &mut writer, options)?;
    tracing::debug!(path = %filename.display(), rows = data.n_rows(), "wrote csv");
    Ok(())
}

/// Decimals needed to show `value` with at most `MAX_TEXT_DECIMALS` places
fn decimals_needed(value: f64) -> usize {
    let rendered = format!("{:.*}", MAX_TEXT_DECIMALS, value);
    let trimmed = rendered.trim_end_matches('0');
    trimmed
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

fn text_cells(column: &Column) -> Vec<String> {
    match column {
        Column::Float(values) => {
            let decimals = values
                .iter()
                .flatten()
                .filter(|v| v.is_finite())
                .map(|v| decimals_needed(*v))
                .max()
                .unwrap_or(0)
                .max(1);
            values
                .iter()
                .map(|value| match value {
                    Some(v) if !v.is_nan() => format!("{:.*}", decimals, v),
                    _ => "NaN".to_string(),
                })
                .collect()
        }
        Column::Integer(values) => values
            .iter()
            .map(|value| value.map_or_else(|| "NaN".to_string(), |v| v.to_string()))
            .collect(),
        Column::Text(values) => values
            .iter()
            .map(|value| value.clone().unwrap_or_else(|| "None".to_string()))
            .collect(),
    }
}

/// Render `data` as a fixed-width table: data columns right-aligned, index left-aligned
pub fn format_table(data: &Table, include_index: bool) -> String {
    let mut rendered: Vec<(String, Vec<String>, bool)> = Vec::with_capacity(data.n_columns() + 1);
    if include_index {
        let name = data
            .index()
            .and_then(|index| index.name.clone())
            .unwrap_or_default();
        rendered.push((name, data.row_labels(), false));
    }
    for (name, column) in data.columns() {
        rendered.push((name.to_string(), text_cells(column), true));
    }

    let widths: Vec<usize> = rendered
        .iter()
        .map(|(header, cells, _)| {
            cells
                .iter()
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render_line = |cell_at: &dyn Fn(usize) -> String| -> String {
        rendered
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, ((_, _, right_align), &width))| {
                let cell = cell_at(i);
                if *right_align {
                    format!("{:>width$}", cell, width = width)
                } else {
                    format!("{:<width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(data.n_rows() + 1);
    lines.push(render_line(&|i| rendered[i].0.clone()));
    for row in 0..data.n_rows() {
        lines.push(render_line(&|i| rendered[i].1[row].clone()));
    }
    lines.join("\n")
}

/// Write the fixed-width rendering of `data` to an open writer
pub fn export_formatted<W: Write>(data: &Table, file: &mut W, include_index: bool) -> crate::Result<()> {
    file.write_all(format_table(data, include_index).as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Write the fixed-width rendering of `data` to a file
pub fn export_formatted_to_path(
    data: &Table,
    filename: impl AsRef<Path>,
    include_index: bool,
) -> crate::Result<()> {
    let mut writer = create_file(filename.as_ref())?;
    export_formatted(data, &mut writer, include_index)
}

/// Export a summary table to CSV and to a human-readable text file, both with the row index
///
/// Both destination directories are checked before anything is written.
pub fn export_summary(
    summary: &Table,
    csv_path: impl AsRef<Path>,
    text_path: impl AsRef<Path>,
) -> crate::Result<()> {
    let csv_path = csv_path.as_ref();
    let text_path = text_path.as_ref();
    ensure_parent_dir(csv_path)?;
    ensure_parent_dir(text_path)?;

    let options = CsvOptions {
        include_index: true,
        ..CsvOptions::default()
    };
    export_to_csv(summary, csv_path, &options)?;
    export_formatted_to_path(summary, text_path, true)?;

    tracing::info!(
        csv = %csv_path.display(),
        text = %text_path.display(),
        "summary exported"
    );
    Ok(())
}
