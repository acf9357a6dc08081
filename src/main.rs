use learnflow::{server, AppConfig};
use log::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = AppConfig::load()?;
    if let Err(e) = server::serve(config).await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
