//! Minimal end-to-end driver over the mock transport.
//!
//! Builds a config, connects a client, subscribes, sends one message, and
//! prints what the backend echoes back.
//!
//! ```text
//! cargo run --example simple
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use chat_sdk::{
    //
    BackoffConfig,
    Client,
    ConfigBuilder,
    RetryPolicy,
    TransportKind,
};

#[tokio::main]
async fn main() -> chat_sdk::Result<()> {
    // ---
    let config = ConfigBuilder::new()
        .api_key("demo")
        .endpoint("mock://")
        .dial_timeout(Duration::from_secs(10))
        .retry(RetryPolicy::ExponentialBackoff(BackoffConfig {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }))
        .build()?;

    let transport = chat_sdk::create_transport(TransportKind::Mock, &config)?;
    let client = Client::new(config, transport)?;

    client.connect(None).await?;

    let mut sub = client.subscribe();

    let cancel = CancellationToken::new();
    client.send("general", "Hello, world!", &cancel).await?;

    match tokio::time::timeout(Duration::from_secs(1), sub.inbox.recv()).await {
        Ok(Some(msg)) => println!("[{}] {} @ {}: {}", msg.channel, msg.from, msg.at, msg.body),
        Ok(None) => println!("subscription ended"),
        Err(_) => println!("no message within 1s"),
    }

    client.unsubscribe(sub.id);
    client.close().await?;
    Ok(())
}
