//! Service wiring: picks the store adapters and assembles the use-case services.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::info;

use shopfront_auth::{AccountService, Hs256TokenService, InMemoryUserStore, TokenService, UserStore};
use shopfront_catalog::Catalog;
use shopfront_contact::{ContactService, ContactStore, InMemoryContactStore};
use shopfront_core::StoreError;
use shopfront_events::InMemoryEventBus;
use shopfront_infra::postgres::{
    self, PostgresContactStore, PostgresOrderStore, PostgresUserStore, PostgresWishlistStore,
};
use shopfront_infra::{AppConfig, NotificationCenter, NotificationWorker, WorkerHandle};
use shopfront_orders::{
    InMemoryOrderStore, OrderEvent, OrderService, OrderStore, PaymentGateway, SimulatedPaymentGateway,
    TransitionPolicy,
};
use shopfront_wishlist::{InMemoryWishlistStore, WishlistService, WishlistStore};

use crate::context::SessionSettings;

pub type OrderBus = Arc<InMemoryEventBus<OrderEvent>>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database setup failed: {0}")]
    Database(#[from] StoreError),

    #[error("failed to start notification worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub accounts: AccountService,
    pub orders: OrderService<OrderBus>,
    pub wishlist: WishlistService,
    pub contact: ContactService,
    pub catalog: Arc<Catalog>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifications: Arc<NotificationCenter>,
    pub tokens: Arc<dyn TokenService>,
    pub session: SessionSettings,
}

struct Stores {
    users: Arc<dyn UserStore>,
    orders: Arc<dyn OrderStore>,
    wishlist: Arc<dyn WishlistStore>,
    contact: Arc<dyn ContactStore>,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            wishlist: Arc::new(InMemoryWishlistStore::new()),
            contact: Arc::new(InMemoryContactStore::new()),
        }
    }

    async fn postgres(database_url: &str) -> Result<Self, StoreError> {
        let pool = postgres::connect(database_url).await?;
        postgres::migrate(&pool).await?;
        Ok(Self {
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            orders: Arc::new(PostgresOrderStore::new(pool.clone())),
            wishlist: Arc::new(PostgresWishlistStore::new(pool.clone())),
            contact: Arc::new(PostgresContactStore::new(pool)),
        })
    }
}

/// Build services and start the notification worker.
///
/// The returned handle stops the worker; dropping the services also ends it
/// once the event bus goes away.
pub async fn build_services(config: &AppConfig) -> Result<(AppServices, WorkerHandle), StartupError> {
    let stores = match &config.database_url {
        Some(url) => {
            info!("using postgres stores");
            Stores::postgres(url).await?
        }
        None => {
            info!("DATABASE_URL not set; using in-memory stores");
            Stores::in_memory()
        }
    };

    let ttl = Duration::days(config.token_ttl_days);
    let tokens: Arc<dyn TokenService> = Arc::new(Hs256TokenService::with_ttl(config.jwt_secret.as_bytes(), ttl));

    let bus: OrderBus = Arc::new(InMemoryEventBus::new());
    let notifications = Arc::new(NotificationCenter::new());
    let worker = NotificationWorker::spawn(&bus, notifications.clone())?;

    let payments: Arc<dyn PaymentGateway> = Arc::new(SimulatedPaymentGateway::new());
    let policy = if config.strict_status_transitions {
        TransitionPolicy::Strict
    } else {
        TransitionPolicy::Permissive
    };

    let catalog = Arc::new(Catalog::seeded());

    let services = AppServices {
        accounts: AccountService::new(stores.users, tokens.clone(), config.admin_email.clone()),
        orders: OrderService::new(stores.orders, payments.clone(), bus).with_policy(policy),
        wishlist: WishlistService::new(stores.wishlist, catalog.clone()),
        contact: ContactService::new(stores.contact),
        catalog,
        payments,
        notifications,
        tokens,
        session: SessionSettings {
            secure: config.cookie_secure,
            max_age_secs: ttl.num_seconds(),
        },
    };

    Ok((services, worker))
}
