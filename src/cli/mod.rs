//! Command-line parsing for the demo front-end.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the marshalling/engine code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vox", version, about = "Voxel-wise model fitting front-end")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic dataset, run the full pipeline, print a summary.
    Fit(FitArgs),
    /// List the registered models.
    Models,
    /// Print a model's declared option descriptors.
    Options(OptionsArgs),
}

/// Options for the synthetic demo fit.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Grid size along x.
    #[arg(long, default_value_t = 8)]
    pub nx: usize,

    /// Grid size along y.
    #[arg(long, default_value_t = 8)]
    pub ny: usize,

    /// Grid size along z.
    #[arg(long, default_value_t = 2)]
    pub nz: usize,

    /// Points per voxel (series length).
    #[arg(long, default_value_t = 10)]
    pub nt: usize,

    /// Model to fit.
    #[arg(long, default_value = "poly")]
    pub model: String,

    /// Polynomial degree (generation and fitting).
    #[arg(long, default_value_t = 2)]
    pub degree: usize,

    /// Random seed for data generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gaussian noise standard deviation added to the generated series.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Request per-parameter means.
    #[arg(long)]
    pub save_mean: bool,

    /// Request per-parameter standard deviations.
    #[arg(long)]
    pub save_std: bool,

    /// Request per-parameter z-statistics.
    #[arg(long)]
    pub save_zstat: bool,

    /// Request the fitted model series.
    #[arg(long)]
    pub save_model_fit: bool,

    /// Request the residual series.
    #[arg(long)]
    pub save_residuals: bool,

    /// Export outputs to a JSON file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for inspecting a model.
#[derive(Debug, Parser)]
pub struct OptionsArgs {
    /// Model name to inspect.
    #[arg(long)]
    pub model: String,
}
