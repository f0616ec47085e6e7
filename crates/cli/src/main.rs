//! Tomasulo simulator CLI.
//!
//! This binary wraps the `tomsim-core` library:
//! 1. **Run:** load a program (assembly or JSON) and an optional JSON
//!    configuration, simulate to completion, and report the final register
//!    file, memory, and cycle count.
//! 2. **Check:** parse and validate a program without running it.
//!
//! `--trace` prints one line per pipeline event to stderr; `RUST_LOG`
//! additionally exposes the library's `tracing` output.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use tomsim_core::sim::loader;
use tomsim_core::trace::StderrSink;
use tomsim_core::{Instruction, SimConfig, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "tomsim",
    author,
    version,
    about = "Tomasulo dynamic-scheduling simulator",
    long_about = "Simulate a program over Tomasulo's algorithm, one clock cycle at a time.\n\nPrograms are assembly text (one instruction per line) or .json record arrays. The configuration JSON sets per-opcode reservation-station counts and execution latencies.\n\nExamples:\n  tomsim run program.s\n  tomsim run program.json --config pipeline.json --trace\n  tomsim check program.s"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program to completion and report the final machine state.
    Run {
        /// Program file: assembly text, or a `.json` record array.
        program: PathBuf,

        /// Configuration JSON (station counts, latencies, memory size).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print a per-cycle pipeline trace to stderr.
        #[arg(long)]
        trace: bool,

        /// Override the configured cycle cap.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Print the statistics report after the run.
        #[arg(long)]
        stats: bool,
    },

    /// Parse and validate a program without running it.
    Check {
        /// Program file to validate.
        program: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { program, config, trace, max_cycles, stats } => {
            cmd_run(&program, config.as_deref(), trace, max_cycles, stats);
        }
        Commands::Check { program } => cmd_check(&program),
    }
}

/// Runs the simulator and prints the final machine state.
fn cmd_run(
    program_path: &Path,
    config_path: Option<&Path>,
    trace: bool,
    max_cycles: Option<u64>,
    stats: bool,
) {
    let mut config = load_config(config_path);
    if let Some(cap) = max_cycles {
        config.max_cycles = cap;
    }
    let program = load_program(program_path);

    println!(
        "[*] Program: {} ({} instructions)",
        program_path.display(),
        program.len()
    );

    let mut sim = Simulator::new(program, &config).unwrap_or_else(|e| {
        eprintln!("[!] Configuration rejected: {e}");
        process::exit(1);
    });
    if trace {
        sim.attach(Box::new(StderrSink));
    }

    match sim.run() {
        Ok(summary) => {
            println!("[*] Completed in {} cycles", summary.cycles);
            println!();
            sim.pipeline().registers().dump();
            let touched: Vec<(usize, i64)> = summary
                .memory
                .iter()
                .enumerate()
                .filter(|&(_, &word)| word != 0)
                .map(|(addr, &word)| (addr, word))
                .collect();
            if !touched.is_empty() {
                println!();
                for (addr, word) in touched {
                    println!("mem[{addr}] = {word}");
                }
            }
            if stats {
                println!();
                summary.stats.print();
            }
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            sim.pipeline().stats().print();
            process::exit(1);
        }
    }
}

/// Parses a program and prints the decoded listing.
fn cmd_check(program_path: &Path) {
    let program = load_program(program_path);
    for (pc, inst) in program.iter().enumerate() {
        println!("{pc:>4}: {inst}");
    }
    println!("[*] {} instructions OK", program.len());
}

fn load_program(path: &Path) -> Vec<Instruction> {
    loader::load_program(path).unwrap_or_else(|e| {
        eprintln!("[!] {}: {e}", path.display());
        process::exit(1);
    })
}

fn load_config(path: Option<&Path>) -> SimConfig {
    let Some(path) = path else {
        return SimConfig::default();
    };
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("[!] Could not read config '{}': {e}", path.display());
        process::exit(1);
    });
    SimConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("[!] {}: {e}", path.display());
        process::exit(1);
    })
}
