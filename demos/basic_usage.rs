//! Basic usage example for the NotLocalStorage client
//!
//! Run with: cargo run --example basic_usage
//!
//! Credentials are read from NLS_API_KEY / NLS_APP_KEY.

use nls_client::Client;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // Credentials from the environment, fail fast when unset
    let client = Client::from_env()?;

    // Store a value
    info!("Storing key 'example:greeting'...");
    let reply = client.save("example:greeting", "Hello, NotLocalStorage!").await?;
    info!("Stored! Service replied: {}", String::from_utf8_lossy(&reply));

    // Retrieve it
    info!("Retrieving key 'example:greeting'...");
    let value = client.load("example:greeting").await?;
    info!("Retrieved: {}", String::from_utf8_lossy(&value));

    // Store and retrieve JSON data
    info!("Storing JSON under 'user:alice'...");
    let alice = serde_json::json!({"name": "Alice", "theme": "dark"});
    client.save_json("user:alice", &alice).await?;

    let user: serde_json::Value = client.load_json("user:alice").await?;
    info!("User preferences: {}", user);

    info!("Example completed successfully!");
    Ok(())
}
