use std::sync::Arc;

use outreach_bot::config::Config;
use outreach_bot::engine::{ConversationRegistry, OutreachEngine, ReplyRouter, StatusReconciler};
use outreach_bot::store::{RegistrationStore, RestStore};
use outreach_bot::transport::webhook::webhook_routes;
use outreach_bot::transport::{GatewayTransport, Transport};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    eprintln!("🤖 Outreach Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Table: {} ({} → {})",
        config.table_name, config.status_pending, config.status_confirmed
    );
    eprintln!("   Gateway: {}", config.gateway_url);
    eprintln!(
        "   Webhook: http://0.0.0.0:{}/webhook/message",
        config.webhook_port
    );

    let store: Arc<dyn RegistrationStore> = Arc::new(RestStore::new(&config));

    let gateway = GatewayTransport::new(&config);
    let webhook_app = webhook_routes(gateway.inbound_sender());
    let transport: Arc<dyn Transport> = Arc::new(gateway);

    // Auth/readiness check is fatal: without a paired session nothing works.
    transport.initialize().await?;

    // Inbound webhook server
    let webhook_port = config.webhook_port;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", webhook_port)).await?;
    tokio::spawn(async move {
        tracing::info!(port = webhook_port, "Webhook server started");
        axum::serve(listener, webhook_app).await.ok();
    });

    let registry = ConversationRegistry::new();

    // Reply loop: webhook → transport channel → router
    let reconciler = StatusReconciler::new(Arc::clone(&store), config.status_confirmed.clone());
    let router = ReplyRouter::new(Arc::clone(&registry), Arc::clone(&transport), reconciler);
    let inbound = transport.inbound().await?;
    tokio::spawn(async move { router.run(inbound).await });

    // Subscribe before draining so rows inserted mid-drain are not lost;
    // the subscription primes itself and skips the backlog rows.
    let live = store.subscribe_inserts().await?;

    let engine = OutreachEngine::new(
        Arc::clone(&store),
        Arc::clone(&transport),
        Arc::clone(&registry),
        config.status_pending.clone(),
    );
    let sent = engine.drain_backlog().await;
    eprintln!("   Backlog: {sent} welcome message(s) sent");

    tokio::spawn(async move { engine.run_live_intake(live).await });

    eprintln!("\n✨ Bot ready and listening");
    eprintln!("   - New registrations → welcome message");
    eprintln!("   - Reply \"3\" → confirmation in CRM");
    eprintln!("\n⏹  Press Ctrl+C to stop\n");

    tokio::signal::ctrl_c().await?;
    eprintln!("\n👋 Shutting down");
    Ok(())
}
