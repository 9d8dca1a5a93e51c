use bookstore_server::{config::ServerConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = ServerConfig::load()?;
    bookstore_server::run(args).await
}
