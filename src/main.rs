use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = llm_relay::cli::Cli::parse();
    if let Err(e) = llm_relay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
