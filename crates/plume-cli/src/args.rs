//! Command-line argument definitions for the Plume CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the model document, the diagram to
//! paint, the output path, configuration file selection and logging
//! verbosity.

use clap::Parser;

/// Command-line arguments for the Plume model painter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model document (TOML)
    #[arg(help = "Path to the input model document")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Id of the diagram to paint; the first diagram when omitted
    #[arg(short, long)]
    pub diagram: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
