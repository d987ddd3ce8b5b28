use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use whaletrack::api::router::create_router;
use whaletrack::config::AppConfig;
use whaletrack::db::{self, SentimentStore, WhaleStore};
use whaletrack::models::ChatMessage;
use whaletrack::moralis::MoralisClient;
use whaletrack::services::message_consumer::run_message_consumer;
use whaletrack::services::sentiment_ticker::SentimentTicker;
use whaletrack::services::telegram_listener::run_telegram_listener;
use whaletrack::services::{run_periodic, FirstTick, TrackedToken, WhalePoller, WhaleTracker};
use whaletrack::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let (whale_path, sentiment_path) = db::init_data_dir(&config.data_dir).await?;
    tracing::info!(data_dir = %config.data_dir.display(), "Data directory ready");

    let metrics_handle = whaletrack::metrics::init_metrics()?;

    // --- Whale tracking ---
    if config.moralis_api_key.is_none() {
        tracing::warn!("MORALIS_API_KEY not set, whale reports will use synthetic data");
    }
    let source = MoralisClient::from_config(
        config.moralis_api_key.clone(),
        config.moralis_base_url.clone(),
        config.fetch_timeout(),
    )?;
    let whale_store = Arc::new(WhaleStore::new(whale_path));
    let tracker = Arc::new(WhaleTracker::new(
        Arc::new(source),
        whale_store,
        TrackedToken {
            symbol: config.token_symbol.clone(),
            contract: config.token_contract.clone(),
            chain: config.chain.clone(),
            decimals: config.token_decimals,
        },
        config.fetch_limit,
        config.fetch_timeout(),
    ));

    // --- Sentiment ---
    let sentiment = Arc::new(
        SentimentStore::load(
            sentiment_path,
            config.sentiment_tokens.clone(),
            config.message_window,
        )
        .await,
    );
    let live_source = Arc::new(AtomicBool::new(false));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut background = Vec::new();

    let poller = WhalePoller::new(tracker.clone(), config.watched_whales.clone());
    background.push(tokio::spawn(run_periodic(
        poller,
        Duration::from_secs(config.whale_poll_interval_secs),
        FirstTick::AfterPeriod,
        shutdown_rx.clone(),
    )));
    tracing::info!(
        whales = config.watched_whales.len(),
        interval_secs = config.whale_poll_interval_secs,
        "Whale poller spawned"
    );

    let ticker = SentimentTicker::new(
        sentiment.clone(),
        tracker.fallback().clone(),
        live_source.clone(),
    );
    background.push(tokio::spawn(run_periodic(
        ticker,
        Duration::from_secs(config.sentiment_tick_interval_secs),
        FirstTick::Immediately,
        shutdown_rx.clone(),
    )));

    if let Some(bot_token) = config.telegram_bot_token.clone() {
        let (msg_tx, msg_rx) = mpsc::channel::<ChatMessage>(500);
        let listener_shutdown = shutdown_rx.clone();
        let connected = live_source.clone();
        background.push(tokio::spawn(async move {
            run_telegram_listener(bot_token, msg_tx, connected, listener_shutdown).await;
            0
        }));

        let consumer_store = sentiment.clone();
        background.push(tokio::spawn(run_message_consumer(msg_rx, consumer_store)));
        tracing::info!("Telegram listener spawned");
    } else {
        tracing::info!("TELEGRAM_BOT_TOKEN not set, sentiment runs on synthetic ticks only");
    }

    // --- HTTP ---
    let state = AppState::new(config, tracker, sentiment.clone(), metrics_handle);
    let app = create_router(state);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    for task in background {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task panicked");
        }
    }

    if let Err(e) = sentiment.flush().await {
        tracing::error!(error = %e, "Final sentiment flush failed");
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("whaletrack=info,tower_http=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
