//! ASCII matrix files: one row per line, tab-separated fields.
//!
//! Values are written with shortest round-trip formatting, so a matrix read
//! back from its file equals the original exactly — no precision loss.
//! Errors are plain strings; callers wrap them into their own error domain
//! (the spool reports them as resource failures, the engine as I/O).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::DMatrix;
use ndarray::ArrayView2;

/// Write a matrix in logical row order, independent of storage layout.
pub fn write_ascii_matrix(path: &Path, matrix: ArrayView2<'_, f64>) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("failed to create '{}': {e}", path.display()))?;
    let mut out = BufWriter::new(file);

    let (rows, cols) = matrix.dim();
    for i in 0..rows {
        for j in 0..cols {
            if j > 0 {
                write!(out, "\t").map_err(|e| format!("write failed: {e}"))?;
            }
            write!(out, "{}", matrix[[i, j]]).map_err(|e| format!("write failed: {e}"))?;
        }
        writeln!(out).map_err(|e| format!("write failed: {e}"))?;
    }
    out.flush().map_err(|e| format!("write failed: {e}"))?;
    Ok(())
}

/// Read a whitespace-separated ASCII matrix.
///
/// Blank lines are skipped; every non-blank line must have the same number
/// of fields.
pub fn read_ascii_matrix(path: &Path) -> Result<DMatrix<f64>, String> {
    let file =
        File::open(path).map_err(|e| format!("failed to open '{}': {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("read failed at line {}: {e}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let row: Result<Vec<f64>, String> = trimmed
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|_| format!("invalid value '{field}' at line {}", idx + 1))
            })
            .collect();
        let row = row?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(format!(
                    "ragged matrix: line {} has {} fields, expected {}",
                    idx + 1,
                    row.len(),
                    first.len()
                ));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(format!("'{}' contains no matrix rows", path.display()));
    }

    let nrows = rows.len();
    let ncols = rows[0].len();
    Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
}
