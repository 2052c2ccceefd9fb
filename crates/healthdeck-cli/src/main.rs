//! Thin entrypoint for the `healthdeck` binary.

#[tokio::main]
async fn main() {
    let exit_code = healthdeck_cli::run().await;
    std::process::exit(exit_code);
}
