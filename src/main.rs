use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use slot_gate::capacity::formula::CapacityTable;
use slot_gate::capacity::handlers::{handle_get_capacities, handle_set_capacity};
use slot_gate::capacity::protocol::{ENDPOINT_CAPACITIES, ENDPOINT_SET_CAPACITY};
use slot_gate::capacity::service::CapacityAdmin;
use slot_gate::capacity::store::CapacityCache;
use slot_gate::config::AppConfig;
use slot_gate::notify::handlers::{
    NotifyContext, handle_notification_status, handle_subscribe, handle_toggle,
    handle_vapid_public_key,
};
use slot_gate::notify::prefs::WeeklyState;
use slot_gate::notify::protocol::{
    ENDPOINT_STATUS, ENDPOINT_SUBSCRIBE, ENDPOINT_TOGGLE, ENDPOINT_VAPID_PUBLIC_KEY,
};
use slot_gate::notify::queue::{PushQueue, PushWorker};
use slot_gate::notify::sender::WebPushSender;
use slot_gate::notify::subscriptions::{FileSubscriptionStore, SubscriptionStore};
use slot_gate::notify::vacancy::{Notifier, VacancyDetector};
use slot_gate::ratelimit::limiter::RateLimiter;
use slot_gate::registration::handlers::{
    handle_board, handle_category_states, handle_claim, handle_release,
};
use slot_gate::registration::protocol::{
    ENDPOINT_BOARD, ENDPOINT_CATEGORY_STATES, ENDPOINT_CLAIM, ENDPOINT_RELEASE,
};
use slot_gate::registration::service::Gatekeeper;
use slot_gate::schedule::clock::{Clock, SystemClock};
use slot_gate::schedule::reset::WeeklyResetScheduler;
use slot_gate::schedule::window::WindowSchedule;
use slot_gate::storage::memory::RegistrationStore;
use slot_gate::storage::persistence::PersistenceWorker;
use slot_gate::storage::priority::default_priority;
use slot_gate::storage::snapshot::SnapshotFile;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting slot gate on {}", config.bind);
    tracing::info!("Data directory: {}", config.data_dir.display());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.cycle.offset));

    // 1. Registration board, restored from the last snapshot:
    let store = Arc::new(RegistrationStore::with_priority(default_priority()));
    let board_file = Arc::new(SnapshotFile::new(config.board_path()));
    let persistence = PersistenceWorker::new(store.clone(), board_file.clone(), config.save_interval);
    persistence.restore().await;

    // 2. Capacities, preferences and subscriptions:
    let capacities = Arc::new(CapacityCache::load(SnapshotFile::new(config.capacity_path())).await);
    let weekly = Arc::new(WeeklyState::new());
    let subscriptions: Arc<dyn SubscriptionStore> = Arc::new(
        FileSubscriptionStore::load(SnapshotFile::new(config.subscriptions_path())).await,
    );
    tracing::info!("Loaded {} push subscriptions", subscriptions.len());

    // 3. Notification pipeline:
    let (queue, rx) = PushQueue::bounded(config.push_queue_capacity);
    let notifier = Arc::new(Notifier::new(
        subscriptions.clone(),
        weekly.clone(),
        queue.clone(),
    ));

    let admin = Arc::new(CapacityAdmin::new(
        capacities.clone(),
        weekly.clone(),
        notifier.clone(),
    ));
    let adopted = admin.adopt_loaded();
    if !adopted.is_empty() {
        tracing::info!("Capacities already confirmed for {:?}", adopted);
    }

    let vacancy = Arc::new(VacancyDetector::new(
        CapacityTable::standard(),
        capacities.clone(),
        weekly.clone(),
        store.clone(),
        notifier,
    ));

    // 4. Registration service:
    let limiter = Arc::new(RateLimiter::new());
    let gate = Arc::new(Gatekeeper::new(
        WindowSchedule::new(config.cycle),
        clock.clone(),
        store.clone(),
        limiter.clone(),
        config.register_policy,
        vacancy,
    ));

    let notify_ctx = Arc::new(NotifyContext {
        vapid_public_key: config.vapid_public_key.clone(),
        weekly: weekly.clone(),
        subscriptions: subscriptions.clone(),
        limiter,
        toggle_policy: config.toggle_policy,
    });

    // 5. Background workers:
    let cancel = CancellationToken::new();
    let mut workers = Vec::new();

    let sender = Arc::new(WebPushSender::new(config.vapid.clone())?);
    let push_worker = PushWorker::new(rx, sender, subscriptions.clone());
    workers.push(tokio::spawn(push_worker.run(cancel.clone())));

    workers.push(tokio::spawn(persistence.clone().run(cancel.clone())));

    let scheduler = WeeklyResetScheduler::new(
        config.cycle,
        clock,
        store.clone(),
        board_file,
        capacities,
        weekly,
    );
    workers.push(tokio::spawn(scheduler.run(cancel.clone())));

    // 6. Spawn stats reporter:
    let stats_store = store.clone();
    let stats_queue = queue.clone();
    let stats_subscriptions = subscriptions.clone();
    let stats_cancel = cancel.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));

        loop {
            tokio::select! {
                _ = stats_cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tracing::info!(
                "Gate stats: {} entries, push queue depth={} dropped={}, {} subscriptions",
                stats_store.entry_count(),
                stats_queue.depth(),
                stats_queue.dropped(),
                stats_subscriptions.len()
            );
        }
    });

    // 7. HTTP Router:
    let app = Router::new()
        .route(ENDPOINT_CLAIM, post(handle_claim))
        .route(ENDPOINT_RELEASE, post(handle_release))
        .route(ENDPOINT_BOARD, get(handle_board))
        .route(ENDPOINT_CATEGORY_STATES, get(handle_category_states))
        .route(ENDPOINT_CAPACITIES, get(handle_get_capacities))
        .route(ENDPOINT_SET_CAPACITY, post(handle_set_capacity))
        .route(ENDPOINT_VAPID_PUBLIC_KEY, get(handle_vapid_public_key))
        .route(ENDPOINT_SUBSCRIBE, post(handle_subscribe))
        .route(ENDPOINT_TOGGLE, post(handle_toggle))
        .route(ENDPOINT_STATUS, get(handle_notification_status))
        .layer(Extension(gate))
        .layer(Extension(admin))
        .layer(Extension(notify_ctx));

    // 8. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let shutdown = cancel.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
        shutdown.cancel();
    })
    .await?;

    cancel.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!("Background worker ended abnormally: {}", e);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
