use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookmill::config::Secrets;
use hookmill::events::handlers::LoggingHandler;
use hookmill::events::{EventProcessor, HandlerRegistry};
use hookmill::logfile::ActivityLog;
use hookmill::server::{AppState, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookmill=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Secrets must be present before anything is served; exit with a clear
    // message otherwise.
    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    let cwd = std::env::current_dir().unwrap();
    let events_log_dir = cwd.join("events_log");
    let activity_log = ActivityLog::new(cwd.join("hookmill.log"));

    let mut registry = HandlerRegistry::new();
    registry.register("create", LoggingHandler::new("create", activity_log.clone()));
    registry.register(
        "issue_comment",
        LoggingHandler::new("issue_comment", activity_log.clone()),
    );

    let processor = EventProcessor::new(registry, secrets, events_log_dir, activity_log.clone());
    let app = build_router(AppState::new(processor));

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    activity_log.log("App started!");
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
