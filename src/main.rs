use std::io;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use todo_auth_api::{configure, ApiDoc, AppState, Config};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok(); // Load environment variables from .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Missing or invalid settings (notably JWT_SECRET) are fatal.
    let config = Config::from_env().map_err(|e| {
        log::error!("configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    info!("loaded {:?}", config);

    let state = AppState::from_config(&config).map_err(|e| {
        log::error!("startup failed: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;
    let state = web::Data::new(state);

    info!("Starting Actix Web server on http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
