/// Strand Global CLI
///
/// This binary runs built-in programs and benchmarks without requiring an
/// embedding application. It's useful for debugging and profiling the engine.
use strand_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
