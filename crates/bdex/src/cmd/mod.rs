use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::{CliError, CliResult};
use crate::layout::Layout;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode values against a layout.
    Encode(EncodeArgs),
    /// Decode bytes against a layout and print the fields.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Record layout, e.g. "ver:ver,id:u40,name:str,samples:f32[4]".
    #[arg(long, short = 'l')]
    pub layout: String,
    /// One value per layout field. Array elements are comma-separated,
    /// bytes fields are hex.
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
    /// Write raw bytes instead of hex.
    #[arg(long)]
    pub raw: bool,
    /// Write raw bytes to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", conflicts_with = "raw")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Record layout, e.g. "ver:ver,id:u40,name:str,samples:f32[4]".
    #[arg(long, short = 'l')]
    pub layout: String,
    /// Hex-encoded input.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read input from a file. Default: stdin.
    #[arg(long, value_name = "FILE", conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Accept input left over after the last field.
    #[arg(long)]
    pub allow_trailing: bool,
    /// Reject strings longer than this many bytes.
    #[arg(long, value_name = "BYTES", env = "BDEX_MAX_STRING_LEN")]
    pub max_string_len: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_layout(spec: &str) -> CliResult<Layout> {
    let layout: Layout = spec
        .parse()
        .map_err(|err| CliError::usage(format!("invalid --layout: {err}")))?;
    if layout.is_empty() {
        return Err(CliError::usage("--layout must name at least one field"));
    }
    Ok(layout)
}
