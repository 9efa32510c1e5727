use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "osa-cli")]
#[command(about = "Run AppleScript through the OSA script-engine adapter")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Print the engine descriptor.
    Info(InfoArgs),
    /// Evaluate program text.
    Eval(EvalArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RuntimeKind {
    Library,
    Embedded,
}

#[derive(Debug, Args)]
pub(crate) struct RuntimeArgs {
    #[arg(long = "runtime", value_enum)]
    pub(crate) runtime: Option<RuntimeKind>,
    #[arg(long = "library")]
    pub(crate) library: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct InfoArgs {
    #[command(flatten)]
    pub(crate) runtime: RuntimeArgs,
}

#[derive(Debug, Args)]
pub(crate) struct EvalArgs {
    #[command(flatten)]
    pub(crate) runtime: RuntimeArgs,
    #[arg(long = "expr", conflicts_with = "file")]
    pub(crate) expr: Option<String>,
    #[arg(long = "file")]
    pub(crate) file: Option<PathBuf>,
    /// Engine-scope binding, `name=value`. JSON values are decoded.
    #[arg(long = "bind")]
    pub(crate) bind: Vec<String>,
    /// Global-scope binding, `name=value`.
    #[arg(long = "global")]
    pub(crate) global: Vec<String>,
}
