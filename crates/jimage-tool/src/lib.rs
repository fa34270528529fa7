//! jimage-tool library
//!
//! Argument definitions and command handlers for the `jimage-tool` binary.
//! Every option that configures a build can also be set through a `JIMAGE_*`
//! environment variable.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use jimage_formats::{ByteOrder, DEFAULT_GROWTH_LIMIT, DEFAULT_RETRY_LIMIT};
use jimage_storage::DirArchive;
use jimage_storage::compression::DEFAULT_COMPRESSION_LEVEL;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Build and inspect module images
#[derive(Debug, Parser)]
#[command(
    name = "jimage-tool",
    about = "Build, list, inspect, extract and verify jimage module images",
    version,
    long_about = "A command-line tool for the jimage container format: a single memory-mappable file holding every class and resource of a set of modules behind a perfect hash index."
)]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build an image from exploded module directories
    Build(BuildArgs),

    /// List the resource names stored in an image
    List {
        /// Image file
        image: PathBuf,

        /// Sort names instead of listing them in slot order
        #[arg(short, long)]
        sorted: bool,
    },

    /// Show header and layout information
    Info {
        /// Image file
        image: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Extract resources into a directory
    Extract {
        /// Image file
        image: PathBuf,

        /// Output directory
        #[arg(short, long, env = "JIMAGE_EXTRACT_DIR")]
        dir: PathBuf,

        /// Only extract names starting with this prefix
        #[arg(long)]
        include: Option<String>,
    },

    /// Decode every resource and check its size
    Verify {
        /// Image file
        image: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of the `build` subcommand
#[derive(Debug, clap::Args)]
pub struct BuildArgs {
    /// Output image file
    #[arg(short, long, env = "JIMAGE_OUTPUT")]
    pub output: PathBuf,

    /// Compress every resource with zlib
    #[arg(short, long, env = "JIMAGE_COMPRESS")]
    pub compress: bool,

    /// Zlib level used with --compress
    #[arg(long, env = "JIMAGE_COMPRESSION_LEVEL", default_value_t = DEFAULT_COMPRESSION_LEVEL,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    pub compression_level: u32,

    /// Byte order of the header and index tables
    #[arg(long, value_enum, env = "JIMAGE_BYTE_ORDER", default_value = "native")]
    pub byte_order: ByteOrderArg,

    /// Directory receiving native libraries, commands, config and legal files
    #[arg(long, env = "JIMAGE_EXTERNAL_DIR")]
    pub external_dir: Option<PathBuf>,

    /// Seeds tried per perfect hash bucket before giving up
    #[arg(long, env = "JIMAGE_RETRY_LIMIT", default_value_t = DEFAULT_RETRY_LIMIT)]
    pub retry_limit: u32,

    /// Times the perfect hash table may grow past the resource count
    #[arg(long, env = "JIMAGE_GROWTH_LIMIT", default_value_t = DEFAULT_GROWTH_LIMIT)]
    pub growth_limit: u32,

    /// Print the build summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Module directories, as `path` or `name=path`
    #[arg(required = true, value_parser = parse_module)]
    pub modules: Vec<DirArchive>,
}

/// Byte order choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ByteOrderArg {
    /// Order of the machine running the build
    Native,
    /// Little-endian
    Little,
    /// Big-endian
    Big,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Native => Self::native(),
            ByteOrderArg::Little => Self::Little,
            ByteOrderArg::Big => Self::Big,
        }
    }
}

/// Parse `name=path` or `path` into a module archive
pub fn parse_module(arg: &str) -> Result<DirArchive, String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok(DirArchive::new(name, path))
        }
        Some(_) => Err(format!("expected name=path, got {arg:?}")),
        None => DirArchive::from_path(arg).map_err(|e| e.to_string()),
    }
}

/// Install the tracing subscriber; logs go to stderr
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Build(args) => commands::build::handle(args),
        Commands::List { image, sorted } => commands::list::handle(&image, sorted),
        Commands::Info { image, json } => commands::info::handle(&image, json),
        Commands::Extract {
            image,
            dir,
            include,
        } => commands::extract::handle(&image, &dir, include.as_deref()),
        Commands::Verify { image, json } => commands::verify::handle(&image, json),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use jimage_storage::Archive;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_module() {
        let archive = parse_module("app=/tmp/classes").unwrap();
        assert_eq!(archive.module_name(), "app");
        assert_eq!(archive.root(), std::path::Path::new("/tmp/classes"));

        let archive = parse_module("/opt/mods/java.base").unwrap();
        assert_eq!(archive.module_name(), "java.base");

        assert!(parse_module("=path").is_err());
        assert!(parse_module("name=").is_err());
    }

    #[test]
    fn test_build_args() {
        let cli = Cli::try_parse_from([
            "jimage-tool",
            "build",
            "--output",
            "out/modules",
            "--compress",
            "--byte-order",
            "big",
            "a=mods/a",
            "mods/b",
        ])
        .unwrap();

        let Commands::Build(args) = cli.command else {
            unreachable!("parsed a build command");
        };
        assert!(args.compress);
        assert_eq!(ByteOrder::from(args.byte_order), ByteOrder::Big);
        assert_eq!(args.retry_limit, DEFAULT_RETRY_LIMIT);
        assert_eq!(args.growth_limit, DEFAULT_GROWTH_LIMIT);
        assert_eq!(args.modules.len(), 2);
        assert_eq!(args.modules[1].module_name(), "b");
    }

    #[test]
    fn test_build_requires_modules() {
        assert!(Cli::try_parse_from(["jimage-tool", "build", "--output", "x"]).is_err());
    }
}
