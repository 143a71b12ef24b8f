mod archive;
mod errors;
mod file_loader;
mod handlers;
mod initialization;
mod logging;
mod manager_forecast;
mod manager_meteo;
mod manager_pse;
mod models;
mod render;
mod retry;
mod store;

use actix_web::{middleware, web, App, HttpServer};
use actix_files::Files;
use log::info;
use crate::errors::UnrecoverableError;
use crate::handlers::{
    create_forecast, fetch_generation, fetch_meteo, fetch_meteo_forecast, get_agg_data, upload,
};
use crate::initialization::{config, Config};

pub struct AppState {
    pub config: Config,
}

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    logging::setup_logging();
    let config = config()?;
    let web_data = web::Data::new(AppState { config: config.clone() });

    info!("starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(web_data.clone())
            .service(fetch_meteo)
            .service(fetch_meteo_forecast)
            .service(fetch_generation)
            .service(upload)
            .service(create_forecast)
            .service(get_agg_data)
            .service(
                web::scope("")
                    .wrap(middleware::DefaultHeaders::new().add(("Cache-Control", "no-cache")))
                    .service(Files::new("/", "./static").index_file("index.html"))
            )
    })
        .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
        .run()
        .await?;

    Ok(())
}
