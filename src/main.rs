//! Train on the training CSV, save the model, reload it with the built-in
//! mapping registry and report accuracy on the evaluation CSV.

use aircode::cli::{self, CliError, CommonArgs, EvalArgs, TrainArgs};
use clap::Parser;

#[derive(Parser)]
#[command(name = "aircode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict aircraft IATA type codes from flight codes", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    train: TrainArgs,

    #[command(flatten)]
    eval: EvalArgs,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), CliError> {
    let mut config = args.common.load_config()?;
    args.train.apply(&mut config);
    args.eval.apply(&mut config);
    cli::init_logging(&config);

    let outcome = cli::train(&config)?;
    if let Some(err) = outcome.save_error {
        return Err(err.into());
    }

    // Reload so the evaluated model is exactly what was persisted.
    let model = cli::load_model(&config)?;
    let report = cli::evaluate(&model, &config)?;
    tracing::info!(
        "Evaluated {} records: {} correct, {} incorrect",
        report.tally.total(),
        report.tally.correct,
        report.tally.incorrect
    );
    println!("Accuracy: {}", report.accuracy);
    Ok(())
}
