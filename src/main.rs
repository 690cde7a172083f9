use dotenvy::dotenv;
use std::sync::Arc;
use storefront_sync::{
    app::{AdminConsole, now},
    config::{
        admin::get_admin_password,
        database::{create_connection, create_tables},
        shop::load_default_config,
    },
    core::{
        admin::AdminGate,
        cart::CartStore,
        product::seed_catalog,
        session::SessionRegistry,
    },
    errors::Result,
    storage::{FileStorage, LocalStorage},
    store::RemoteStore,
    view::{TracingSink, ViewSync},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Shop settings and seed catalog
    let config = load_default_config()?;
    info!(shop = %config.shop.name, currency = %config.shop.currency, "Loaded shop configuration");

    // 4. Device storage (also creates the data directory the default database lives in)
    let storage: Arc<dyn LocalStorage> = Arc::new(
        FileStorage::open(&config.shop.storage_dir)
            .inspect_err(|e| error!("Failed to open local storage: {e}"))?,
    );

    // 5. Remote store
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db).await?;
    let store = RemoteStore::open(db).await?;
    info!("Database initialized successfully.");

    let seeded = seed_catalog(&store, &config.products, now()).await?;
    if seeded > 0 {
        info!(seeded, "Seeded empty catalog from config.toml");
    }

    // 6. Shopper side: heartbeat for the device's user and a cart summary
    let session = SessionRegistry::load(Arc::clone(&storage));
    match session.current() {
        Some(user) => {
            info!(user_id = user.id, name = %user.name, "Welcome back");
            session.heartbeat(&store, now()).await;
        }
        None => info!("No shopper registered on this device"),
    }
    let totals = CartStore::load(Arc::clone(&storage)).totals();
    info!(items = totals.item_count, amount = totals.amount, "Cart restored");

    // 7. Admin side: render the console to the log, then a dashboard summary
    let password = get_admin_password();
    if password.is_none() {
        info!("ADMIN_PASSWORD unset, admin console is locked");
    }
    let gate = AdminGate::new(password, storage);
    info!(admin_session = gate.is_authenticated(now()), "Admin gate ready");
    let mut console = AdminConsole::new(store, gate, ViewSync::new(TracingSink));
    console.start(now());
    let stats = console.aggregator().stats(now());
    info!(
        products = stats.total_products,
        users = stats.total_users,
        active_users = stats.active_users,
        active_carts = stats.active_carts,
        orders = stats.total_orders,
        revenue = stats.total_revenue,
        sold = stats.total_products_sold,
        "Dashboard"
    );

    Ok(())
}
