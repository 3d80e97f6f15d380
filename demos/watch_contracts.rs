use covenant_client::{ClientConfig, RealtimeClient, RealtimeOptions};

/// Subscribe to contract events and print updates as they stream in.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ClientConfig::from_env();
    let token = std::env::var(&config.token_key)
        .expect("set the auth token env var before running this demo");

    println!("🦀 Watching Covenant contract events\n");
    println!("📡 Connecting to: {}\n", config.ws_base_url);

    let client = RealtimeClient::new(&config.ws_base_url, RealtimeOptions::default())?;

    client
        .on_message("contract_update", |message| {
            println!(
                "📄 contract {} -> {}",
                message.field("contract_id").cloned().unwrap_or_default(),
                message.field("status").cloned().unwrap_or_default()
            );
        })
        .await;
    client
        .on_message("analysis_complete", |message| {
            println!(
                "🔍 analysis done for {} (risk score {})",
                message.field("contract_id").cloned().unwrap_or_default(),
                message.field("risk_score").cloned().unwrap_or_default()
            );
        })
        .await;
    client
        .on_connection(|open| {
            if !open {
                println!("⚠️  connection lost, reconnecting automatically...");
            }
        })
        .await;

    client.connect(&token).await?;
    client
        .subscribe(vec!["contracts".to_string(), "analyses".to_string()])
        .await?;
    println!("✅ Subscribed. Waiting for events (ctrl-c to quit)...\n");

    tokio::signal::ctrl_c().await?;
    client.disconnect().await?;
    Ok(())
}
