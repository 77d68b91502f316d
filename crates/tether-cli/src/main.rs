//! Tether CLI
//!
//! Runs Lua scripts bridged to the host types in the `host` namespace.
//! Set `TETHER_LOG` (e.g. `TETHER_LOG=tether_core=debug`) to see bridge logs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tether_cli::commands::{eval, run, types};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Run Lua scripts against Rust host types", long_about = None)]
#[command(version)]
struct Cli {
    /// Bridge options file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Lua script
    Run {
        /// Script file
        file: PathBuf,
        /// Arguments available to the script through `Env.args()`
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Evaluate an inline chunk and print its results
    Eval {
        /// Lua code
        code: String,
    },

    /// List the host types scripts can use
    Types {
        /// Only list this namespace
        namespace: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TETHER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run { file, args } => {
            let code = run::execute(&file, args, config)?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Eval { code } => {
            let output = eval::execute(&code, config)?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }

        Commands::Types { namespace } => {
            for name in types::execute(namespace.as_deref()) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
