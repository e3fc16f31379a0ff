// texbatch/src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "texbatch")]
#[command(about = "Tile, blur and preview lighting HDRs, or mip-map textures", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Exit without waiting for Enter
    #[arg(long, global = true)]
    pub no_wait: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert the HDRs under _ADAPTLOOKDEV_/lighting/hdr
    Hdr {
        /// Scene root (defaults to the executable's directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Write <stem>-mipmap.tx beside every texture
    Textures {
        /// Root directory to walk (defaults to the executable's directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Folder names to skip, separated by ';'
        #[arg(short, long, default_value = "")]
        exclude: String,
    },
}

/// Split `"a; b;;c"` into `["a", "b", "c"]`.
pub fn parse_exclusions(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
