//! Export a run's outputs to JSON.
//!
//! The export is meant to be easy to consume in notebooks or downstream
//! scripts: each output carries its dimensions and a column-major value
//! list, plus the run log.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::FitOutput;
use crate::error::RunError;
use crate::marshal::bind::flatten_fortran;

#[derive(Debug, Serialize)]
struct ExportFile<'a> {
    tool: &'static str,
    model: &'a str,
    outputs: Vec<ExportItem>,
    log: &'a str,
}

#[derive(Debug, Serialize)]
struct ExportItem {
    name: String,
    dims: Vec<usize>,
    /// Column-major element order, matching the host convention.
    values: Vec<f32>,
}

/// Write a run's outputs to a JSON file.
pub fn write_results_json(path: &Path, output: &FitOutput, model: &str) -> Result<(), RunError> {
    let file = File::create(path).map_err(|e| {
        RunError::resource(format!(
            "failed to create export JSON '{}': {e}",
            path.display()
        ))
    })?;

    let export = ExportFile {
        tool: "vox",
        model,
        outputs: output
            .items
            .iter()
            .map(|item| ExportItem {
                name: item.name.clone(),
                dims: item.array.shape().to_vec(),
                values: flatten_fortran(item.array.view()),
            })
            .collect(),
        log: &output.log,
    };

    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| RunError::resource(format!("failed to write export JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutputItem;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn export_writes_every_output_and_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let output = FitOutput {
            items: vec![OutputItem {
                name: "mean_c0".to_string(),
                array: ArrayD::from_elem(IxDyn(&[2, 1, 1]), 1.5f32),
            }],
            log: "Run started\nFit complete\n".to_string(),
        };

        write_results_json(&path, &output, "poly").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["model"], "poly");
        assert_eq!(parsed["outputs"][0]["name"], "mean_c0");
        assert_eq!(parsed["outputs"][0]["dims"][0], 2);
        assert!(parsed["log"].as_str().unwrap().contains("Fit complete"));
    }
}
