use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use taskflow::api;
use taskflow::config::AppConfig;
use taskflow::services::email::EmailRelay;
use taskflow::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (state, outbox) = match AppState::from_config(config.clone()) {
        Ok(built) => built,
        Err(e) => {
            log::error!("Failed to initialise storage: {}", e);
            std::process::exit(1);
        }
    };

    // Drain automation emails in the background
    let relay = EmailRelay::new(config.email_relay_url.clone(), config.email_from.clone());
    actix_web::rt::spawn(relay.run(outbox));

    let state = web::Data::new(state);
    log::info!(
        "Starting Taskflow Backend at http://{}:{}",
        config.bind_addr,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(api::config)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
