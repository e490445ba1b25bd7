use clap::Parser;
use plp_compare::{PlpComparison, RunOptions};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => match RunOptions::from_file(path) {
            Ok(options) => options,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => RunOptions::default(),
    };
    let options = args.apply_to(base);

    let start_time = std::time::Instant::now();
    let comparison = match PlpComparison::new(&args.as_is, &args.to_be)
        .with_options(options)
        .run()
        .await
    {
        Ok(comparison) => comparison,
        Err(e) => {
            ::log::error!("Comparison failed: {}", e);
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    ::log::info!(
        "Comparison complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match serde_json::to_string_pretty(&comparison) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Failed to serialize comparison: {}", e);
            ExitCode::FAILURE
        }
    }
}
