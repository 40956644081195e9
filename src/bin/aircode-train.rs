//! Train a flight-code classifier and save it.

use aircode::cli::{self, CliError, CommonArgs, TrainArgs};
use clap::Parser;

#[derive(Parser)]
#[command(name = "aircode-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and save a flight-code classifier", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    train: TrainArgs,
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
    cli::init_logging(&config);

    let outcome = cli::train(&config)?;
    println!(
        "trained on {} rows: {} labels, {} features",
        outcome.rows,
        outcome.model.labels().len(),
        outcome.model.feature_len()
    );
    match (outcome.saved_to, outcome.save_error) {
        (Some(path), _) => {
            println!("saved model to {}", path.display());
            Ok(())
        }
        (None, Some(err)) => Err(err.into()),
        (None, None) => Ok(()),
    }
}
