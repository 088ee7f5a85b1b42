use {
    anyhow::Result,
    clap::Parser,
    racevec::stress::{self, StressConfig, Variant},
    std::{process::ExitCode, time::Duration},
    tracing_subscriber::EnvFilter,
};

/// Stress growable-array containers under concurrent appends and report
/// whether the final contents match what was appended.
///
/// A detected race against the `unsafe` variant is the documented outcome
/// and exits 0; only harness faults (timeouts, poisoned locks, bad
/// arguments) exit nonzero.
#[derive(Debug, Parser)]
#[command(name = "racevec", version, about)]
struct Args {
    /// Container variant to stress
    #[arg(long, default_value_t = Variant::Unsafe)]
    variant: Variant,

    /// Number of concurrent appender threads
    #[arg(long, default_value_t = 2)]
    threads: usize,

    /// Appends each thread performs
    #[arg(long, default_value_t = 10_000)]
    ops_per_thread: usize,

    /// Seconds to wait for the workers before reporting the run as
    /// incomplete
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Repeat the run this many times and summarize how many raced
    #[arg(long, default_value_t = 1)]
    runs: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(error) = stress_main(&args) {
        eprintln!("error: {error:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn stress_main(args: &Args) -> Result<()> {
    let config = StressConfig {
        variant: args.variant,
        threads: args.threads,
        ops_per_thread: args.ops_per_thread,
        timeout: Duration::from_secs(args.timeout),
    };

    let runs = args.runs.max(1);
    let mut races = 0;
    for run_index in 1..=runs {
        let report = stress::run(&config)?;
        if runs > 1 {
            println!("--- run {run_index}/{runs} ---");
        }
        println!("{report}");
        if report.race_detected() {
            races += 1;
        }
    }
    if runs > 1 {
        println!("races detected in {races} of {runs} runs");
    }
    Ok(())
}
