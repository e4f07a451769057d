use clap::{Parser, Subcommand};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lpframe_lp::{LpDiff, LpWriter, SignatureCheck, WriterOptions};
use lpframe_model::VarKind;

#[derive(Parser)]
#[command(name = "lpframe")]
#[command(about = "Check, format and compare LP model files", long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `lpframe_lp=trace` (overrides LPFRAME_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read an .lp file, build the model and validate it
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Parse an .lp file and output the document
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Rewrite an .lp file in canonical form
    Fmt {
        /// The file to format
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Column budget for wrapped lines
        #[arg(long, default_value_t = 80)]
        width: usize,
        /// Leave out the signature comment
        #[arg(long)]
        no_signature: bool,
        /// Print `x<id>`/`c<id>` instead of declared names
        #[arg(long)]
        generic_names: bool,
    },
    /// Recompute the signature and compare it with the embedded one
    Signature {
        /// The file to verify
        file: PathBuf,
    },
    /// Compare two .lp files, ignoring signatures and blank lines
    Compare {
        /// The reference file
        expected: PathBuf,
        /// The file to check against it
        actual: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    match cli.command {
        Commands::Check { file } => {
            let model = match lpframe_lp::read_lp_file(&file) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = model.ensure_valid() {
                eprintln!("✗ {} has errors:", file.display());
                for issue in e.issues() {
                    eprintln!("  {}", issue);
                }
                std::process::exit(1);
            }

            let count = |kind: VarKind| model.variables().iter().filter(|v| v.kind == kind).count();
            let sense = model
                .objective()
                .map(|o| o.sense.as_str())
                .unwrap_or("none");

            println!("✓ {} is valid", file.display());
            println!("  {} continuous variables", count(VarKind::Continuous));
            println!("  {} integer variables", count(VarKind::Integer));
            println!("  {} binary variables", count(VarKind::Binary));
            println!("  {} constraints", model.num_constraints());
            println!("  objective: {}", sense);
        }
        Commands::Parse { file, format } => {
            let source = read_source(&file);

            match lpframe_lp::Parser::parse(&source) {
                Ok(document) => {
                    if format == "json" {
                        match serde_json::to_string_pretty(&document) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Error encoding JSON: {}", e);
                                std::process::exit(1);
                            }
                        }
                    } else {
                        println!("{:#?}", document);
                    }
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fmt {
            file,
            output,
            width,
            no_signature,
            generic_names,
        } => {
            let model = match lpframe_lp::read_lp_file(&file) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let writer = LpWriter::new(
                WriterOptions::default()
                    .with_max_line_length(width)
                    .with_signature(!no_signature)
                    .with_var_names(!generic_names),
            );
            let written = match &output {
                Some(path) => writer.write_file(&model, path),
                None => writer.write_to(&model, io::stdout().lock()),
            };
            if let Err(e) = written {
                eprintln!("Write error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Signature { file } => {
            let source = read_source(&file);

            match lpframe_lp::verify(&source) {
                SignatureCheck::Match(actual) => {
                    println!("✓ {} signature {} matches", file.display(), actual);
                }
                SignatureCheck::Mismatch { embedded, actual } => {
                    println!("✗ {} signature mismatch", file.display());
                    println!("  embedded: {}", embedded);
                    println!("  actual:   {}", actual);
                    std::process::exit(1);
                }
                SignatureCheck::Missing { actual } => {
                    println!("{} has no signature", file.display());
                    println!("  actual: {}", actual);
                }
            }
        }
        Commands::Compare { expected, actual } => {
            let want = read_source(&expected);
            let got = read_source(&actual);

            match lpframe_lp::lp_equivalent(&want, &got) {
                Ok(()) => println!("✓ {} matches {}", actual.display(), expected.display()),
                Err(diff) => {
                    println!("✗ {} differs from {}", actual.display(), expected.display());
                    match diff {
                        LpDiff::Line {
                            line,
                            expected,
                            actual,
                        } => {
                            println!("  line {}:", line);
                            println!("  - {}", expected);
                            println!("  + {}", actual);
                        }
                        LpDiff::Length { .. } => println!("  {}", diff),
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Install a stderr subscriber.
///
/// The filter comes from `--log-level`, else `LPFRAME_LOG`, else `off`.
/// `LPFRAME_LOG_FORMAT` picks `pretty` (default) or `json` output.
fn init_logging(level: Option<String>) -> Result<(), String> {
    let level_value = level
        .or_else(|| env::var("LPFRAME_LOG").ok())
        .unwrap_or_else(|| "off".to_string());

    let filter = if level_value.eq_ignore_ascii_case("off") {
        EnvFilter::default().add_directive(LevelFilter::OFF.into())
    } else {
        EnvFilter::try_new(&level_value).map_err(|err| format!("Invalid log filter: {err}"))?
    };

    let format = env::var("LPFRAME_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let use_json = format.eq_ignore_ascii_case("json");
    if !use_json && !format.eq_ignore_ascii_case("pretty") {
        return Err("Invalid LPFRAME_LOG_FORMAT (expected 'json' or 'pretty')".to_string());
    }

    let registry = tracing_subscriber::registry().with(filter);
    let result = if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).pretty())
            .try_init()
    };
    result.map_err(|err| format!("Failed to initialize logging: {err}"))
}
