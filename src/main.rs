use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};
use std::io;
use std::sync::Arc;

mod api;
mod config;
mod errors;
mod models;
mod services;

use services::{
    blockchain_service::BlockchainClient, catalog_service::CatalogService,
    exchange_service::ExchangeService, price_service::PriceService,
};

fn startup_error(e: errors::CustomError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env().map_err(startup_error)?;

    let validation = config.validate();
    if let Some(reason) = validation.reason.as_deref() {
        warn!("faucet wallet misconfigured, exchange operations will fail: {}", reason);
    }

    let chain = BlockchainClient::new(&config.rpc_url, config.chain_id)
        .await
        .map_err(startup_error)?;

    let port = config.port;
    let prices = PriceService::new(config.price_api_key.clone(), config.price_asset_id.clone());
    let exchange = ExchangeService::new(config, Arc::new(chain)).map_err(startup_error)?;
    info!("serving {} exchange on port {}", exchange.network().name, port);

    let state = web::Data::new(api::AppState {
        exchange,
        catalog: CatalogService::load().map_err(startup_error)?,
        prices,
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .app_data(state.clone())
            .configure(api::config)
            .wrap(cors)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
