// Licensed under the Apache-2.0 license

use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

mod registers;

pub static PROJECT_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf()
});

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Xtask {
    /// Log every bank placement
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    xtask: Commands,
}

/// Which SoC to generate for and how its CSR bus is shaped.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct SocArgs {
    /// Include the Ethernet MAC/PHY, I2S and LED peripherals
    #[arg(long, default_value_t = false)]
    with_ethernet: bool,

    /// Load the SoC from an hjson description instead of the built-in Arty target
    #[arg(long)]
    description: Option<PathBuf>,

    /// hjson file overriding the built-in Arty target's configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSR bus data width in bits
    #[arg(long)]
    csr_data_width: Option<u32>,

    /// Absolute address of the CSR region
    #[arg(long, value_parser=maybe_hex::<u64>)]
    csr_base: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate csr.h, csr.json and csr.csv
    CsrAutogen {
        /// Check output instead of updating the files
        #[arg(short, long, default_value_t = false)]
        check: bool,

        #[command(flatten)]
        soc: SocArgs,

        /// Directory the artifacts are written to (or checked in)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only emit address defines, without static inline accessors
        #[arg(long, default_value_t = false)]
        no_access_functions: bool,
    },
    /// Print the allocated CSR map and interrupt table
    CsrMap {
        #[command(flatten)]
        soc: SocArgs,
    },
}

fn main() {
    let cli = Xtask::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = simple_logger::SimpleLogger::new().with_level(level).init();

    let result = match &cli.xtask {
        Commands::CsrAutogen {
            check,
            soc,
            output_dir,
            no_access_functions,
        } => registers::autogen(
            *check,
            soc,
            output_dir.as_deref(),
            !*no_access_functions,
        ),
        Commands::CsrMap { soc } => registers::print_map(soc),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    });
}
