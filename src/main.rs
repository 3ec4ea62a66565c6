use std::time::Duration;

mod app;
mod blockchain;
mod campaigns;
mod chain;
mod config;
mod errors;
mod extract;
mod state;
mod storage;
mod users;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "crowdchain=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;

    if state.config.chain.watch_events {
        let interval = Duration::from_secs(state.config.chain.poll_interval_secs.max(1));
        tokio::spawn(chain::events::watch_platform_events(
            state.chain.clone(),
            interval,
        ));
    }

    app::serve(app::build_app(state)).await
}
