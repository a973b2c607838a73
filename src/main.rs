use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use iset_leave::config::Config;
use iset_leave::db::init_db;
use iset_leave::docs::ApiDoc;
use iset_leave::leave::LeaveService;
use iset_leave::leave::notify::LeaveEvent;
use iset_leave::leave::refresh::spawn_refresh;
use iset_leave::routes;
use iset_leave::store::mysql::{MySqlLeaveStore, MySqlRequesterDirectory};

#[get("/")]
async fn index() -> impl Responder {
    "ISET Jendouba leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let service = Arc::new(LeaveService::new(
        Arc::new(MySqlLeaveStore::new(pool.clone())),
        Arc::new(MySqlRequesterDirectory::new(pool.clone())),
        config.leave_policy(),
    ));

    service.subscribe(Arc::new(|event: &LeaveEvent| {
        info!(
            kind = %event.kind,
            leave_id = ?event.request_id,
            requester_id = ?event.requester_id,
            "Leave data changed"
        );
    }));

    let _refresh = spawn_refresh(Arc::clone(&service), config.refresh_interval());

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let service_data = Data::from(service);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(service_data.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
