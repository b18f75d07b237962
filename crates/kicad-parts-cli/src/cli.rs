use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    author = "jheyse",
    version = env!("CARGO_PKG_VERSION"),
    about = "kicad-parts - Import and manage KiCad libraries from LCSC",
    long_about = "kicad-parts imports parts from LCSC/EasyEDA into a staging library, enriches them with distributor metadata, and promotes reviewed parts into production libraries."
)]
pub struct KicadParts {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a part from LCSC to staging
    Import {
        #[clap(help = "LCSC part number (e.g., C2040)")]
        lcsc_id: String,
    },
    /// Move staged parts to a production library
    Accept {
        #[clap(help = "Part name or LCSC number to accept (accepts all if omitted)")]
        part: Option<String>,

        #[clap(
            long,
            short,
            help = "Library category (e.g., 'Connector', 'MCU_ST_STM32'). Prompts interactively if omitted."
        )]
        library: Option<String>,
    },
    /// List parts in production or staging libraries
    List {
        #[clap(long, short, help = "Show detailed metadata")]
        verbose: bool,

        #[clap(long, short, help = "List staged parts instead of production")]
        staging: bool,
    },
    /// Delete parts from production libraries
    Delete {
        #[clap(help = "Part name (interactive if omitted)")]
        part: Option<String>,

        #[clap(long, short, help = "Library name (e.g., 'Connector-JH')")]
        library: Option<String>,
    },
}
