//! Evaluate a saved flight-code classifier against a labeled CSV.

use aircode::cli::{self, CliError, CommonArgs, EvalArgs};
use clap::Parser;

#[derive(Parser)]
#[command(name = "aircode-eval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate a saved flight-code classifier", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    eval: EvalArgs,

    /// Number of most frequent confusions to print
    #[arg(long, default_value_t = 10)]
    top_confusions: usize,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), CliError> {
    let mut config = args.common.load_config()?;
    args.eval.apply(&mut config);
    cli::init_logging(&config);

    let model = cli::load_model(&config)?;
    let report = cli::evaluate(&model, &config)?;
    println!(
        "accuracy: {:.4} ({} / {})",
        report.accuracy,
        report.tally.correct,
        report.tally.total()
    );
    print!("{}", cli::format_class_report(&report, args.top_confusions));
    Ok(())
}
