use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::user::{normalize_email, User, ROLE_ADMIN};
use crate::domain::ports::{
    AdminConfigRepository, AuthRepository, BookingRepository, InventoryRepository,
    NotificationRepository, PosRepository, SubscriptionRepository, UserRepository,
};
use crate::domain::services::auth_service::{hash_password, AuthService};
use crate::domain::services::notification_service::NotificationService;
use crate::domain::services::subscription_service::SubscriptionService;
use crate::infra::repositories::{
    postgres_user_repo::PostgresUserRepo, postgres_auth_repo::PostgresAuthRepo,
    postgres_booking_repo::PostgresBookingRepo, postgres_subscription_repo::PostgresSubscriptionRepo,
    postgres_admin_config_repo::PostgresAdminConfigRepo, postgres_notification_repo::PostgresNotificationRepo,
    postgres_inventory_repo::PostgresInventoryRepo, postgres_pos_repo::PostgresPosRepo,
    sqlite_user_repo::SqliteUserRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_subscription_repo::SqliteSubscriptionRepo,
    sqlite_admin_config_repo::SqliteAdminConfigRepo, sqlite_notification_repo::SqliteNotificationRepo,
    sqlite_inventory_repo::SqliteInventoryRepo, sqlite_pos_repo::SqlitePosRepo,
};

/// One implementation of every repository port, all sharing a single pool.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub admin_config: Arc<dyn AdminConfigRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub pos: Arc<dyn PosRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth: Arc::new(PostgresAuthRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            admin_config: Arc::new(PostgresAdminConfigRepo::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            inventory: Arc::new(PostgresInventoryRepo::new(pool.clone())),
            pos: Arc::new(PostgresPosRepo::new(pool)),
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth: Arc::new(SqliteAuthRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            subscriptions: Arc::new(SqliteSubscriptionRepo::new(pool.clone())),
            admin_config: Arc::new(SqliteAdminConfigRepo::new(pool.clone())),
            notifications: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            inventory: Arc::new(SqliteInventoryRepo::new(pool.clone())),
            pos: Arc::new(SqlitePosRepo::new(pool)),
        }
    }
}

pub fn build_state(config: &Config, repos: Repositories) -> Result<AppState, AppError> {
    let auth_service = Arc::new(AuthService::new(repos.auth.clone(), config.clone())?);
    let notifications = Arc::new(NotificationService::new(repos.notifications.clone())?);
    let subscriptions = Arc::new(SubscriptionService::new(repos.subscriptions.clone(), notifications.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: repos.users,
        auth_repo: repos.auth,
        booking_repo: repos.bookings,
        subscription_repo: repos.subscriptions,
        config_repo: repos.admin_config,
        notification_repo: repos.notifications,
        inventory_repo: repos.inventory,
        pos_repo: repos.pos,
        auth_service,
        notifications,
        subscriptions,
    })
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    let state = build_state(config, repos).expect("Failed to assemble application state");

    ensure_admin_account(&state).await.expect("Failed to provision admin account");
    state
}

/// Creates the configured bootstrap admin unless an account with that email exists.
pub async fn ensure_admin_account(state: &AppState) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) else {
        warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; skipping admin provisioning");
        return Ok(());
    };

    if state.user_repo.find_by_email(&normalize_email(email)).await?.is_some() {
        return Ok(());
    }

    let admin = User::new(email.clone(), "Administrator".to_string(), hash_password(password)?, ROLE_ADMIN);
    let created = state.user_repo.create(&admin).await?;
    info!("Provisioned admin account {}", created.id);
    Ok(())
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
