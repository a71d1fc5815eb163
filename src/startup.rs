use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::{PasswordHasher, TokenService};
use crate::configuration::{Settings, StoreBackend, TableSettings};
use crate::error::{AppError, ConfigError, StoreError, ValidationError};
use crate::gate::NoteGate;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_note, delete_note, get_current_user, get_note, health_check, list_notes, login,
    register, update_note,
};
use crate::store::{MemoryStore, PgStore, Store, TableRegistry};

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub notes: Arc<NoteGate>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        tables: &TableSettings,
        hasher: PasswordHasher,
        tokens: TokenService,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let accounts = AccountService::new(store.clone(), &tables.users, hasher, tokens.clone());
        let notes = NoteGate::new(store, &tables.notes);

        Self {
            accounts: Arc::new(accounts),
            notes: Arc::new(notes),
            tokens,
        }
    }
}

/// Resolve the signing secret and open the configured store.
///
/// Fails before anything is served if the secret is missing in production
/// or the database cannot be reached.
pub async fn build_state(settings: &Settings) -> Result<AppState, AppError> {
    let secret = settings
        .jwt
        .signing_secret(settings.application.environment)?;
    tracing::info!(source = ?secret.source(), "JWT signing secret resolved");

    let registry = TableRegistry::from_settings(&settings.tables);

    let store: Arc<dyn Store> = match settings.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new(registry))
        }
        StoreBackend::Postgres => {
            let database = settings.database.as_ref().ok_or_else(|| {
                ConfigError::MissingRequired(
                    "database settings are required for the postgres store".to_string(),
                )
            })?;

            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    StoreError::Unavailable(e.to_string())
                })?;

            let store = PgStore::new(pool, registry);
            store.migrate().await?;
            tracing::info!("Database connection pool created successfully");
            Arc::new(store)
        }
    };

    Ok(AppState::new(
        store,
        &settings.tables,
        PasswordHasher::new(settings.password.cost),
        TokenService::new(&secret),
    ))
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let accounts = web::Data::from(state.accounts);
    let notes = web::Data::from(state.notes);
    let tokens = state.tokens;

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedPayload(err.to_string())).into()
        });

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(json_config)
            .app_data(accounts.clone())
            .app_data(notes.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))

            // Protected routes
            .service(
                web::resource("/auth/me")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route(web::get().to(get_current_user)),
            )
            .service(
                web::scope("/notes")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route("", web::get().to(list_notes))
                    .route("", web::post().to(create_note))
                    .route("/{note_id}", web::get().to(get_note))
                    .route("/{note_id}", web::put().to(update_note))
                    .route("/{note_id}", web::delete().to(delete_note)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
