mod app;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reactor_core::{plugin_fn, reactor_logger, CombinedReactor, Reactor, Store};

use crate::app::{
    counter_reducers, status_reducers, AppAction, AppPayload, CounterState, StatusState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reactor=debug".parse()?))
        .init();

    let path = config::config_path();
    let config = config::load_or_default(path.as_deref())?;
    info!(?config, "Playground starting");

    // Logs the state around every dispatch, like a hand-written middleware would.
    let before_after = plugin_fn(
        "before-after",
        |store: &Store<CounterState, AppAction, AppPayload>, action, next| {
            info!(state = ?store.get_state(), "before");
            info!(action = ?action, "action");
            let result = next.run(action);
            info!(state = ?store.get_state(), "after");
            result
        },
    );

    let counter = Reactor::builder(
        "counter",
        CounterState {
            value: config.counter.initial,
        },
        counter_reducers()?,
    )
    .plugins([before_after])
    .plugin(reactor_logger(config.logger.clone()))
    .build();

    let subscription = counter.subscribe(|state| info!(value = state.value, "counter changed"));

    counter.actions()[AppAction::IncrementByAmount].send(AppPayload::Amount(config.counter.step))?;
    counter.actions()[AppAction::Decrement].send(AppPayload::None)?;
    counter.actions()[AppAction::Increment].send(AppPayload::None)?;
    counter.actions()[AppAction::Increment].send(AppPayload::None)?;

    let delay = Duration::from_millis(config.resolver_delay_ms);
    counter.actions()[AppAction::IncrementByAmountAsync]
        .resolve(|store| async move {
            tokio::time::sleep(delay).await;
            info!(seen = store.get_state().value, "resolving async payload");
            anyhow::Ok(AppPayload::Amount(2))
        })
        .await?;

    subscription.unsubscribe();
    info!(value = counter.get_state().value, "counter finished");

    // Combined: the same counter next to a status reactor.
    let status = Reactor::builder(
        "status",
        StatusState {
            text: "idle".to_string(),
            changes: 0,
        },
        status_reducers()?,
    )
    .build();

    let combined = CombinedReactor::builder()
        .name("app")
        .member(&counter)
        .member(&status)
        .plugin(reactor_logger(config.logger.clone()))
        .build()?;

    let notifications = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    {
        let notifications = notifications.clone();
        combined.subscribe(move |state| {
            notifications.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            info!(state = ?state, "combined changed");
        });
    }

    combined.send(AppAction::SetStatus, AppPayload::Status("counting".into()))?;
    combined.send(AppAction::IncrementByAmount, AppPayload::Amount(10))?;
    // Both members handle reset: two notifications.
    combined.send(AppAction::Reset, AppPayload::None)?;

    let summary = combined.select(|s| {
        (
            s.get::<CounterState>("counter").map(|c| c.value),
            s.get::<StatusState>("status").map(|st| st.text.clone()),
        )
    });
    info!(
        counter = ?summary.0,
        status = ?summary.1,
        notifications = notifications.load(std::sync::atomic::Ordering::Relaxed),
        "Playground finished"
    );

    Ok(())
}
