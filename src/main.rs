//! Music Assistant Spotify Lovelace
//!
//! A bridge between Home Assistant and Music Assistant.

use ma_spotify_lovelace::adapters::music_assistant::MusicAssistantClient;
use ma_spotify_lovelace::adapters::traits::MusicAssistantApi;
use ma_spotify_lovelace::{api, bus, config, integration};

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ma_spotify_lovelace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Music Assistant Spotify Lovelace v{} ({})",
        env!("MASL_VERSION"),
        env!("MASL_GIT_SHA")
    );

    // Load configuration
    let config = config::load_config()?;
    tracing::info!("Configuration loaded, port: {}", config.port);

    // Create event bus
    let bus = bus::create_bus();

    // Integration setup: validate the Music Assistant server, then install it
    let integration = Arc::new(integration::Integration::with_provider(
        bus.clone(),
        config.provider.clone(),
    ));

    match config.music_assistant {
        Some(ref ma_config) => {
            let client: Arc<dyn MusicAssistantApi> = Arc::new(MusicAssistantClient::new(
                &ma_config.url,
                ma_config.token.clone(),
            )?);
            match integration::validate_input(Some(client.as_ref())).await {
                Ok(entry) => {
                    integration.setup(client, &ma_config.url).await;
                    tracing::info!("{} ready", entry.title);
                }
                Err(e) => {
                    tracing::error!(
                        "Music Assistant at {} failed validation ({}); actions will fail until restart",
                        ma_config.url,
                        e.key()
                    );
                }
            }
        }
        None => {
            tracing::error!("Music Assistant not found. Please install and configure it first.");
        }
    }

    let state = api::AppState::new(integration.clone(), bus.clone());

    // Initialize MQTT adapter
    #[cfg(feature = "mqtt")]
    let (state, mqtt) = {
        use ma_spotify_lovelace::adapters::mqtt::MqttAdapter;

        let mqtt = Arc::new(MqttAdapter::new(integration.clone(), bus.clone()));
        if let Some(ref mqtt_config) = config.mqtt {
            mqtt.configure(
                mqtt_config.host.clone(),
                Some(mqtt_config.port),
                mqtt_config.username.clone(),
                mqtt_config.password.clone(),
                mqtt_config.topic_prefix.clone(),
            )
            .await;

            if let Err(e) = mqtt.start().await {
                tracing::warn!("Failed to start MQTT adapter: {}", e);
            } else {
                tracing::info!("MQTT adapter started for {}", mqtt_config.host);
            }
        }
        (state.with_mqtt(mqtt.clone()), mqtt)
    };

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup: unload the integration
    tracing::info!("Shutting down...");
    #[cfg(feature = "mqtt")]
    mqtt.stop().await;
    integration.teardown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
