use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use flow_membership::adapters::http::{app_router, BillingAppState, BillingPorts, BillingSettings};
use flow_membership::adapters::{
    FlowGatewayClient, HickoryMxResolver, HttpMembershipNotifier, InMemoryCustomerMirror,
    InMemoryObservationLog, PostgresCustomerMirror, PostgresObservationLog, StaticMxResolver,
};
use flow_membership::config::{AppConfig, ConfigError, ServerConfig};
use flow_membership::ports::{CustomerMirror, GatewayError, MxResolver, NotifierError, ObservationLog};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations: {0}")]
    Migrations(#[from] sqlx::migrate::MigrateError),

    #[error("gateway client: {0}")]
    Gateway(#[from] GatewayError),

    #[error("membership notifier: {0}")]
    Notifier(#[from] NotifierError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            // Logging is configured from the config, so report on stderr.
            eprintln!("config error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.server);

    if let Err(e) = run(config).await {
        error!(error = %e, "startup failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate().map_err(ConfigError::from)?;

    let (observation_log, mirror) = storage(&config).await?;

    let mx_resolver: Arc<dyn MxResolver> = if config.email.mx_check_enabled {
        Arc::new(HickoryMxResolver::from_system(config.email.dns_timeout()))
    } else {
        info!("MX checks disabled; accepting any well-formed email");
        Arc::new(StaticMxResolver::allow_all())
    };

    let ports = BillingPorts {
        gateway: Arc::new(FlowGatewayClient::new(config.gateway.flow_config())?),
        mirror,
        observation_log,
        notifier: Arc::new(HttpMembershipNotifier::new(
            config.membership.notifier_config(),
        )?),
        mx_resolver,
    };
    let settings = BillingSettings {
        subscription_urls: config.gateway.subscription_urls(),
        reconciler: config.reconciler.settings(),
        status_codes: config.reconciler.status_codes(),
        notifier_timeout: config.membership.timeout(),
        callback_verifier: config.gateway.callback_verifier(),
    };

    let app = app_router(BillingAppState::new(ports, settings), &config.server);

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = ?config.server.environment,
        gateway = %config.gateway.base_url,
        plans = ?config.reconciler.plan_list(),
        verify_callbacks = config.gateway.verify_callbacks,
        "flow-membership listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed the server runs
/// until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

async fn storage(
    config: &AppConfig,
) -> Result<(Arc<dyn ObservationLog>, Arc<dyn CustomerMirror>), StartupError> {
    match &config.database {
        Some(database) => {
            let pool = database.connect().await?;
            if database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!("database migrations applied");
            }
            Ok((
                Arc::new(PostgresObservationLog::new(pool.clone())),
                Arc::new(PostgresCustomerMirror::new(pool)),
            ))
        }
        None => {
            info!("no database configured; using in-memory storage");
            Ok((
                Arc::new(InMemoryObservationLog::new()),
                Arc::new(InMemoryCustomerMirror::new()),
            ))
        }
    }
}

fn init_logging(server: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}
