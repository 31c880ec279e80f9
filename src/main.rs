#[tokio::main]
async fn main() {
    if let Err(err) = legacy_use::mcp::server::run_stdio().await {
        eprintln!("legacy-use: {}", err);
        std::process::exit(1);
    }
}
