use std::sync::Arc;

use covenant_client::{ClientConfig, EnvTokenStore, RealtimeClient, RealtimeOptions, RequestClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env();
    println!("📡 API endpoint: {}", config.api_base_url);

    // REST: check the API is up, then list contracts
    let api = RequestClient::new(config.clone(), Arc::new(EnvTokenStore::new()));
    let health = api.health_check().await?;
    println!("✅ API health: {}", health.status);

    let contracts: serde_json::Value = api.get("/contracts").await?;
    println!("📋 contracts: {contracts}");

    // Realtime: connect and watch everything that arrives
    let token = std::env::var(&config.token_key).unwrap_or_default();
    let realtime = RealtimeClient::new(&config.ws_base_url, RealtimeOptions::default())?;

    realtime
        .on_connection(|open| {
            println!("{} realtime {}", if open { "✅" } else { "⚠️" }, if open { "connected" } else { "disconnected" });
        })
        .await;
    realtime
        .on_message("*", |message| {
            println!("📨 {}: {}", message.kind, message.data);
        })
        .await;

    realtime.connect(&token).await?;
    realtime.subscribe(vec!["contracts".to_string()]).await?;

    // Keep connection alive
    tokio::signal::ctrl_c().await?;

    println!("Disconnecting...");
    realtime.disconnect().await?;
    println!("Disconnected!");

    Ok(())
}
