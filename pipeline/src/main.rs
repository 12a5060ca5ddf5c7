//! xbrlpipe CLI - run the spreadsheet to XBRL pipeline stage by stage
//!
//! # Stages
//!
//! ```bash
//! xbrlpipe group                    # Workbook → grouped_csvs/group_<id>.csv
//! xbrlpipe augment                  # grouped_csvs → gemini_output (needs GEMINI_API_KEY)
//! xbrlpipe clean                    # gemini_output → cleaned_csv
//! xbrlpipe combine                  # cleaned_csv → combined.xlsx
//! xbrlpipe xbrl                     # xbrl_input.xlsx → output.xbrl
//! xbrlpipe mfd                      # output.xbrl → output.mfd
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! xbrlpipe transpose                # Workbook → one sheet per path group
//! xbrlpipe map --path a,b --target x --value 1
//! xbrlpipe config                   # Print the effective configuration
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use xbrlpipe::{
    run_augment, run_clean, run_combine, run_group, run_map, run_mfd, run_transpose, run_xbrl,
    GeminiClient, GroupingMode, MapRequest, PipelineConfig, PipelineResult, StageReport,
};

#[derive(Parser)]
#[command(name = "xbrlpipe", version)]
#[command(about = "Spreadsheet to grouped CSV, LLM-augmented CSV, combined workbook, XBRL and MFD", long_about = None)]
struct Cli {
    /// Config file (default: ./xbrlpipe.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format: text (default) or json
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the source workbook into one CSV per group
    Group {
        /// Source workbook
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Sheet to read
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask the model to add example values to every grouped CSV
    Augment {
        /// Directory of grouped CSV files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Extract the fenced CSV block from every generated file
    Clean {
        /// Directory of generated files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate cleaned CSV files into one workbook (or .csv)
    Combine {
        /// Directory of cleaned CSV files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (.xlsx or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lay out path groups horizontally, one sheet per group
    Transpose {
        /// Source workbook
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output workbook
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build an XBRL instance from an annotated table
    Xbrl {
        /// Table with ID, path1, field and value columns (.xlsx or .csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output instance
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// One parent element per (path1, ID) instead of per path1
        #[arg(long)]
        split_by_id: bool,
    },

    /// Build a MapForce mapping for an XBRL instance
    Mfd {
        /// XBRL instance
        #[arg(short, long)]
        xbrl: Option<PathBuf>,

        /// Output mapping
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set one value in an XBRL instance
    Map {
        /// XBRL instance
        #[arg(short, long)]
        xbrl: Option<PathBuf>,

        /// Element path from the root, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        path: Vec<String>,

        /// Element to update, searched below the path
        #[arg(short, long)]
        target: String,

        /// New text of the element
        #[arg(long)]
        value: String,

        /// Output file (default: rewrite the instance)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "xbrlpipe=info",
        1 => "xbrlpipe=debug",
        _ => "xbrlpipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(cli: Cli) -> PipelineResult<()> {
    let mut config = PipelineConfig::load_or_default(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Group { input, sheet, output } => {
            override_with(&mut config.grouper.input, input);
            override_with(&mut config.grouper.sheet, sheet);
            override_with(&mut config.grouper.output_dir, output);
            run_group(&config.grouper)?
        }

        Commands::Augment { input, output, model } => {
            override_with(&mut config.augment.input_dir, input);
            override_with(&mut config.augment.output_dir, output);
            override_with(&mut config.augment.model, model);
            let client = GeminiClient::from_env()?.with_model(&config.augment.model);
            run_augment(&client, &config.augment).await?
        }

        Commands::Clean { input, output } => {
            override_with(&mut config.clean.input_dir, input);
            override_with(&mut config.clean.output_dir, output);
            run_clean(&config.clean)?
        }

        Commands::Combine { input, output } => {
            override_with(&mut config.combine.input_dir, input);
            override_with(&mut config.combine.output, output);
            run_combine(&config.combine)?
        }

        Commands::Transpose { input, output } => {
            override_with(&mut config.transpose.input, input);
            override_with(&mut config.transpose.output, output);
            run_transpose(&config.transpose)?
        }

        Commands::Xbrl {
            input,
            output,
            split_by_id,
        } => {
            override_with(&mut config.xbrl.input, input);
            override_with(&mut config.xbrl.output, output);
            if split_by_id {
                config.xbrl.grouping = GroupingMode::SplitById;
            }
            run_xbrl(&config.xbrl)?
        }

        Commands::Mfd { xbrl, output } => {
            override_with(&mut config.mfd.xbrl, xbrl);
            override_with(&mut config.mfd.output, output);
            run_mfd(&config.mfd)?
        }

        Commands::Map {
            xbrl,
            path,
            target,
            value,
            output,
        } => {
            let request = MapRequest {
                xbrl: xbrl.unwrap_or_else(|| config.xbrl.output.clone()),
                path,
                target,
                value,
                output,
            };
            run_map(&request)?
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            return Ok(());
        }
    };

    print_report(&report);
    Ok(())
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn print_report(report: &StageReport) {
    for path in &report.written {
        println!("{}", path.display());
    }
    if !report.skipped.is_empty() {
        eprintln!("{} input(s) skipped:", report.skipped.len());
        for (path, reason) in &report.skipped {
            eprintln!("   - {}: {}", path.display(), reason);
        }
    }
}
