#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{
    middleware::{Compress, Logger},
    web, App, HttpServer,
};
use signalscout::{
    configure_services,
    session::{token_store_from_settings, PopupChannel, TokenLifecycleManager},
    settings::ScoutSettings,
    workflow::WorkflowClient,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = ScoutSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    // Restore any persisted Reddit tokens
    let store = token_store_from_settings(&settings);
    let manager = TokenLifecycleManager::from_settings(&settings, store).map_err(|e| {
        std::io::Error::other(format!("Failed to initialize Reddit session: {e}"))
    })?;

    start_server(manager, settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(manager: TokenLifecycleManager, settings: ScoutSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    // One Reddit session and one popup handshake shared by all workers
    let manager = web::Data::new(manager);
    let popup = web::Data::new(PopupChannel::new());
    let workflow = web::Data::new(WorkflowClient::from_settings(
        &settings,
        reqwest::Client::new(),
    ));

    // Configure CORS for the front end
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(manager.clone())
            .app_data(popup.clone())
            .app_data(workflow.clone())
            .app_data(web::Data::new(settings.clone()))
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &ScoutSettings) {
    println!("Starting SignalScout on http://{bind_address}");
    println!();
    println!("Reddit OAuth endpoints:");
    println!("  GET  /auth/reddit/login    - Start authorization, returns the Reddit URL");
    println!("  GET  /auth/reddit/wait     - Wait for the popup to finish");
    println!("  GET  /auth/reddit/callback - OAuth redirect target");
    println!("  GET  /auth/reddit/status   - Connection status");
    println!("  POST /auth/reddit/logout   - Forget the Reddit identity");
    println!();
    println!("Reddit API endpoints:");
    println!("  GET  /api/reddit/me        - Authenticated Reddit account");
    println!("  POST /api/reddit/comment   - Comment on a post");
    println!();
    println!("Workflow endpoints:");
    println!("  POST /api/workflow/search  - Trigger the search workflow");
    println!("  POST /api/workflow/comment - Trigger the poster workflow");
    println!();
    println!("OAuth callback URL to register with Reddit:");
    println!("  {}", settings.get_redirect_uri());
    println!();
    println!("System endpoints:");
    println!("  GET  /ping                 - Health check");
}
