use anyhow::Result;
use charlog_cli::OutputFormat;
use charlog_cli::args::{AggregationArgs, FilterArgs};
use charlog_cli::commands;
use charlog_cli::config::DashboardConfig;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "charlog")]
#[command(author, version)]
#[command(
    about = "Summarize parsed Charles Proxy sessions",
    long_about = "charlog reads the JSON files written by the Charles log parser and derives \
                  status code, method, host and timing tables for dashboards or the terminal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Directory holding parsed log files
    #[arg(long, global = true, env = "CHARLES_OUTPUT_DIR", value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display status, method, host and timing summaries
    Stats {
        /// Parsed log file (bare names are looked up in the output directory)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        aggregation: AggregationArgs,
    },

    /// Write the entries matching the filters as JSON
    Filter {
        /// Parsed log file (bare names are looked up in the output directory)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Browse individual entries
    Entries {
        /// Parsed log file (bare names are looked up in the output directory)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Show one entry, bodies included
        #[arg(long, value_name = "INDEX")]
        show: Option<usize>,
    },

    /// List parsed log files in the output directory
    List {
        /// Create the output directory if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  \
        bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n  \
        bash:  charlog completion --shell bash >> ~/.bashrc\n  \
        zsh:   charlog completion --shell zsh > ~/.zfunc/_charlog\n  \
        fish:  charlog completion --shell fish > ~/.config/fish/completions/charlog.fish")]
    Completion {
        /// Target shell
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let dashboard = DashboardConfig::with_override(cli.output_dir);

    match cli.command {
        Commands::Stats {
            file,
            filters,
            aggregation,
        } => commands::stats::execute(&file, &filters, &aggregation, &dashboard, cli.format),
        Commands::Filter {
            file,
            filters,
            output,
        } => commands::filter::execute(&file, &filters, output, &dashboard),
        Commands::Entries {
            file,
            filters,
            show,
        } => commands::entries::execute(&file, &filters, show, &dashboard, cli.format),
        Commands::List { create } => commands::list::execute(&dashboard, create, cli.format),
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command(), &mut io::stdout())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("charlog=debug,charlog_cli=debug,charlog_core=debug")
    } else {
        EnvFilter::new("charlog=info,charlog_cli=info,charlog_core=warn")
    };

    // stdout carries the command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
