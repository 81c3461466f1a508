use actix_web::{get, web, HttpResponse};

use crate::{
    errors::CustomError,
    models::{api_response::success_response, catalog::CatalogQuery},
};

use super::AppState;

#[get("/tokens")]
async fn list_tokens(
    state: web::Data<AppState>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, CustomError> {
    Ok(success_response(state.catalog.list(&query)))
}

#[get("/tokens/stats")]
async fn token_stats(state: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    let stats = state.catalog.stats().ok_or(CustomError::NotFoundError)?;
    Ok(success_response(stats))
}

#[get("/price")]
async fn native_price(state: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    Ok(success_response(state.prices.native_price().await?))
}
