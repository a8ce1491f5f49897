use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::info;

use tmap::{Aig, CutEngine, MappingGoal, Result, TechMapper};

#[derive(Debug, Parser)]
#[command(name = "tmap", version, about = "FPGA technology mapping of AIGs onto K-input LUTs")]
struct Cli {
    /// Input AIGER file (.aag ASCII or .aig binary).
    input: PathBuf,

    /// Number of LUT inputs (must be at least 2).
    #[arg(value_name = "K", default_value_t = 6)]
    k: u32,

    /// Priority cuts kept per node (0 keeps all cuts).
    #[arg(value_name = "C", default_value_t = 0)]
    c: u32,

    /// Mapping goal: 'd' minimizes delay, anything else minimizes area.
    #[arg(value_name = "GOAL", default_value = "a")]
    goal: String,
}

fn run(cli: &Cli) -> Result<()> {
    let goal = if cli.goal.starts_with('d') {
        MappingGoal::MinimizeDelay
    } else {
        MappingGoal::MinimizeArea
    };

    let time_total = Instant::now();

    let aig = Aig::from_file(&cli.input)?;
    info!(
        "read {} ({} inputs, {} latches, {} outputs, {} and-nodes)",
        aig.source(),
        aig.num_inputs(),
        aig.num_latches(),
        aig.num_outputs(),
        aig.num_ands()
    );

    let mut engine = CutEngine::new(&aig, goal, cli.k, cli.c)?;
    let mut mapper = TechMapper::new(&mut engine);
    mapper.run()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    mapper.write_results(&mut out)?;
    mapper.write_implementation(&mut out)?;
    drop(mapper);
    write!(out, "{}", engine)?;
    writeln!(out)?;
    engine.write_implementation(&mut out)?;
    out.flush()?;

    info!("all done in {:?}", time_total.elapsed());
    Ok(())
}

fn main() -> ExitCode {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("An error has ocurred.\n  what(): {}", e);
            ExitCode::FAILURE
        }
    }
}
