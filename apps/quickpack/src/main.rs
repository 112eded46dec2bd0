use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use quickpack_build::Config;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "quickpack")]
#[command(about = "A small front-end build orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the project into a hashed output tree
    Build(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Build(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running build (using {} threads)", num_threads);
            debug!("Config: root={:?}, config={:?}, mode={:?}", cfg.root, cfg.config, cfg.mode);

            match quickpack_build::run_build(cfg) {
                Ok(result) => {
                    let elapsed_ms = start.elapsed().as_millis();
                    quickpack_build::print_build_report(&mut stdout, &result)?;

                    writeln!(
                        stdout,
                        "\n{} Finished in {}ms on {} files (using {} threads).",
                        "●".bright_blue(),
                        elapsed_ms.to_string().cyan(),
                        result.files_analyzed.to_string().cyan(),
                        num_threads.to_string().cyan()
                    )?;
                    stdout.flush()?;
                }
                Err(e) => {
                    writeln!(stdout, "{} Build failed: {:#}", "✗".red().bold(), e)?;
                    stdout.flush()?;

                    // Non-zero exit to fail CI
                    std::process::exit(1);
                }
            }

            Ok(())
        }
    }
}
