use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};

use task_manager::auth::AuthSettings;
use task_manager::config::Config;
use task_manager::routes;
use task_manager::{seed, store};

fn to_io_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io_error)?;
    if !config.uses_database() && !config.seed_data {
        warn!("SEED_DATA is off and the in-memory store starts empty");
    }

    let store = store::connect(&config).await.map_err(to_io_error)?;
    let auth_settings = AuthSettings::from(&config);

    if config.seed_data {
        seed::seed(store.as_ref(), &auth_settings)
            .await
            .map_err(to_io_error)?;
    }

    let store = web::Data::from(store);
    let auth_settings = web::Data::new(auth_settings);

    info!("Starting Task Manager server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(auth_settings.clone())
            .wrap(routes::cors())
            .wrap(Logger::default())
            .configure(routes::app)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
