//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main"
//! that parses CLI arguments, generates the synthetic dataset, runs the
//! fitting pipeline, prints the summary, and writes optional exports.

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, OptionsArgs};
use crate::domain::{DemoConfig, RunRecord};
use crate::engine::registry;
use crate::error::RunError;

pub mod pipeline;

/// Entry point for the `vox` binary.
pub fn run() -> Result<(), RunError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Models => handle_models(),
        Command::Options(args) => handle_options(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), RunError> {
    let config = demo_config_from_args(&args);
    let sample = crate::data::generate_dataset(&config)?;

    let mut record = RunRecord::new();
    record.set("model", config.model.as_str());
    record.set("degree", config.degree as f64);
    if config.save_mean {
        record.set("save_mean", true);
    }
    if config.save_std {
        record.set("save_std", true);
    }
    if config.save_zstat {
        record.set("save_zstat", true);
    }
    if config.save_model_fit {
        record.set("save_model_fit", true);
    }
    if config.save_residuals {
        record.set("save_residuals", true);
    }

    let output = pipeline::run_fit(&sample.data, &sample.mask, &record)?;

    println!("{}", crate::report::format_run_summary(&config, &output));

    if let Some(path) = &config.export {
        crate::io::export::write_results_json(path, &output, &config.model)?;
        println!("Exported to {}", path.display());
    }

    Ok(())
}

fn handle_models() -> Result<(), RunError> {
    registry::init_defaults();
    for name in registry::model_names() {
        println!("{name}");
    }
    Ok(())
}

fn handle_options(args: OptionsArgs) -> Result<(), RunError> {
    registry::init_defaults();
    let model = registry::instantiate(&args.model).map_err(RunError::from)?;

    for opt in model.options() {
        println!("{:<16} {:<8} {}", opt.name, opt.kind.as_str(), opt.description);
    }
    Ok(())
}

pub fn demo_config_from_args(args: &FitArgs) -> DemoConfig {
    DemoConfig {
        nx: args.nx,
        ny: args.ny,
        nz: args.nz,
        nt: args.nt,
        model: args.model.clone(),
        degree: args.degree,
        seed: args.seed,
        noise_sd: args.noise,
        save_mean: args.save_mean,
        save_std: args.save_std,
        save_zstat: args.save_zstat,
        save_model_fit: args.save_model_fit,
        save_residuals: args.save_residuals,
        export: args.export.clone(),
    }
}
