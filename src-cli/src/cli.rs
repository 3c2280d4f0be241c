use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "docfold",
    version,
    about = "Fold word-processing packages, in order, into a copy of a template"
)]
pub struct Cli {
    /// Package whose styles, settings and section properties the result keeps
    #[arg(long)]
    pub template: PathBuf,

    /// Where the merged package is written; left untouched on failure
    #[arg(long, short)]
    pub output: PathBuf,

    /// JSON file with fold options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read and normalize each source only when its turn comes
    #[arg(long, default_value_t = false)]
    pub no_prefetch: bool,

    /// Print the per-source report as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub report: bool,

    /// Packages to fold, in order; none writes a copy of the template
    pub sources: Vec<PathBuf>,
}
