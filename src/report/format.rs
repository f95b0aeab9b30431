//! Formatted terminal output for a demo run.

use crate::domain::{DemoConfig, FitOutput, OutputItem};

/// Format the full run summary: configuration, per-output table, log size.
pub fn format_run_summary(config: &DemoConfig, output: &FitOutput) -> String {
    let mut out = String::new();

    out.push_str("=== vox - voxel-wise model fit ===\n");
    out.push_str(&format!("Model: {} (degree {})\n", config.model, config.degree));
    out.push_str(&format!(
        "Grid: {}x{}x{} | {} points per voxel\n",
        config.nx, config.ny, config.nz, config.nt
    ));
    out.push_str(&format!(
        "Sample: seed={} noise_sd={}\n",
        config.seed, config.noise_sd
    ));

    out.push_str("\nOutputs:\n");
    for item in &output.items {
        out.push_str(&format!(
            "  {:<16} {:<12} {}\n",
            item.name,
            fmt_dims(item.array.shape()),
            fmt_range(item)
        ));
    }

    let log_lines = output.log.lines().count();
    out.push_str(&format!("\nLog: {log_lines} lines\n"));

    out
}

fn fmt_dims(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x")
}

fn fmt_range(item: &OutputItem) -> String {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in item.array.iter() {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo.is_finite() && hi.is_finite() {
        format!("[{lo:.4}, {hi:.4}]")
    } else {
        "[-]".to_string()
    }
}
