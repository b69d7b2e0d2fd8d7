pub mod assistant;
pub mod cli;
pub mod config;
pub mod history;
pub mod models;
pub mod persistence;
pub mod responder;
pub mod sensors;
pub mod server;
pub mod voice;

use assistant::{ Assistant, TypingDelay };
use chrono::Utc;
use cli::Args;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensors::BiometricReading;
use server::{ AppContext, Server };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn typing_delay_from_args(args: &Args) -> TypingDelay {
    if args.typing_delay_max_ms == 0 {
        TypingDelay::NONE
    } else {
        TypingDelay::new(args.typing_delay_min_ms, args.typing_delay_max_ms)
    }
}

pub async fn build_context(args: &Args) -> Result<AppContext, Box<dyn Error + Send + Sync>> {
    let history_store = history::initialize_conversation_store(args)?;
    let mut assistant = Assistant::new(history_store).with_typing_delay(typing_delay_from_args(args));
    if let Some(path) = &args.rules_path {
        assistant = assistant.with_rules_file(path)?;
    } else {
        info!("Using built-in intent rules");
    }

    let records = persistence::create_persistence_client(args)?;

    let (sensor_tx, sensor_rx) = watch::channel(BiometricReading::baseline(Utc::now()));
    if args.disable_sensors {
        info!("Biometric simulator disabled");
    } else {
        tokio::spawn(
            sensors::run_simulator(
                StdRng::from_entropy(),
                Duration::from_millis(args.sensor_interval_ms.max(1)),
                sensor_tx
            )
        );
    }

    Ok(AppContext {
        assistant: Arc::new(assistant),
        records,
        biometrics: sensor_rx,
        history_default_limit: args.history_default_limit,
    })
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Port: {:?}", args.http_port);
    info!("History Store Type: {}", args.history_type);
    info!("History Store Host: {}", args.history_host);
    info!("Persistence Type: {}", args.persistence_type);
    info!("Persistence Host: {}", args.persistence_host);
    info!("Rules Path: {}", args.rules_path.as_deref().unwrap_or("(built-in)"));
    info!("Typing Delay: {}-{} ms", args.typing_delay_min_ms, args.typing_delay_max_ms);
    info!("Sensors Enabled: {}", !args.disable_sensors);
    info!("TLS Enabled: {}", args.tls_enabled());
    info!("-------------------------");

    let context = build_context(&args).await?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, context, args.clone());
    server.run().await?;

    Ok(())
}
