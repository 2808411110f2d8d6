//! Irori messaging server entry point.
//!
//! JWT-authenticated direct/group chat over HTTP, with live room broadcast
//! over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin irori-server
//! cargo run --bin irori-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin irori-server -- --database-url sqlite:irori.db
//! ```

use std::sync::Arc;

use clap::Parser;

use irori_server::{
    infrastructure::{
        ConnectionRegistry, SqliteChatStore,
        security::{JwtIdentityVerifier, TokenService},
    },
    ui::Server,
    usecase::{
        AuthUseCase, ChatUseCase, JoinRoomUseCase, LeaveRoomUseCase, RouteMessageUseCase,
        RouteTypingUseCase,
    },
};
use irori_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "irori-server")]
#[command(about = "Real-time messaging server with direct and group chat", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// SQLite database URL (the file is created if missing)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:irori.db")]
    database_url: String,

    /// Secret used to sign and verify JWTs
    #[arg(
        long,
        env = "JWT_SECRET",
        hide_env_values = true,
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Store (SQLite, schema bootstrap)
    // 2. TokenService / IdentityVerifier
    // 3. ConnectionRegistry
    // 4. UseCases
    // 5. Server

    // 1. Open the database and bootstrap the schema
    let store = match SqliteChatStore::connect(&args.database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open database '{}': {}", args.database_url, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Database ready at {}", args.database_url);

    // 2. Token service and the JWT-backed identity verifier
    let tokens = Arc::new(TokenService::new(&args.jwt_secret));
    let verifier = Arc::new(JwtIdentityVerifier::new(tokens.clone(), store.clone()));

    // 3. Connection registry: the single in-process authority for presence
    let registry = Arc::new(ConnectionRegistry::new());

    // 4. Create UseCases
    let auth_usecase = Arc::new(AuthUseCase::new(store.clone(), tokens.clone()));
    let chat_usecase = Arc::new(ChatUseCase::new(store.clone()));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(store.clone(), registry.clone()));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(registry.clone()));
    let route_message_usecase = Arc::new(RouteMessageUseCase::new(store.clone(), registry.clone()));
    let route_typing_usecase = Arc::new(RouteTypingUseCase::new(registry.clone()));

    // 5. Create and run the server
    let server = Server::new(
        registry,
        verifier,
        auth_usecase,
        chat_usecase,
        join_room_usecase,
        leave_room_usecase,
        route_message_usecase,
        route_typing_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
