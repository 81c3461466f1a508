use actix_web::{get, post, web, HttpResponse};
use ethers::{types::U256, utils::parse_ether};
use log::info;
use uuid::Uuid;

use crate::{
    errors::CustomError,
    models::{
        api_response::{success_response, transaction_response, validation_response},
        exchange::{ClaimRequest, CompleteSellRequest, FreeClaimRequest, SellRequest},
        settlement::SettlementQuery,
    },
};

use super::AppState;

/// Parse a decimal token amount ("1.5") into 18-decimal units.
fn parse_token_amount(raw: &str) -> Result<U256, CustomError> {
    let amount = parse_ether(raw.trim())
        .map_err(|_| CustomError::InvalidAmountError(raw.to_string()))?;
    if amount.is_zero() {
        return Err(CustomError::InvalidAmountError(raw.to_string()));
    }
    Ok(amount)
}

#[get("/config/validate")]
async fn validate_config(state: web::Data<AppState>) -> HttpResponse {
    validation_response(state.exchange.validate_config())
}

#[get("/faucet")]
async fn faucet_status(state: web::Data<AppState>) -> Result<HttpResponse, CustomError> {
    Ok(success_response(state.exchange.faucet_status().await?))
}

#[get("/balances/{address}")]
async fn get_balances(
    state: web::Data<AppState>,
    address: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    Ok(success_response(state.exchange.balances(&address).await?))
}

#[post("/claim")]
async fn claim_with_payment(
    state: web::Data<AppState>,
    req: web::Json<ClaimRequest>,
) -> Result<HttpResponse, CustomError> {
    let amount = parse_token_amount(&req.amount)?;
    info!("claim of {} tokens requested by {}", req.amount, req.user_address);

    let result = state
        .exchange
        .claim_with_signed_payment(&req.user_address, amount, &req.signed_payment)
        .await;
    Ok(transaction_response(result))
}

#[post("/claim/free")]
async fn claim_free(
    state: web::Data<AppState>,
    req: web::Json<FreeClaimRequest>,
) -> Result<HttpResponse, CustomError> {
    let amount = req.amount.as_deref().map(parse_token_amount).transpose()?;

    let result = state.exchange.claim_tokens(&req.user_address, amount).await;
    Ok(transaction_response(result))
}

#[post("/sell/validate")]
async fn sell_validate(
    state: web::Data<AppState>,
    req: web::Json<SellRequest>,
) -> Result<HttpResponse, CustomError> {
    let amount = parse_token_amount(&req.amount)?;
    let validation = state.exchange.sell_validate(&req.user_address, amount).await;
    Ok(validation_response(validation))
}

#[post("/sell/complete")]
async fn sell_complete(
    state: web::Data<AppState>,
    req: web::Json<CompleteSellRequest>,
) -> Result<HttpResponse, CustomError> {
    let amount = parse_token_amount(&req.amount)?;
    info!(
        "sell of {} tokens by {} with transfer {}",
        req.amount, req.user_address, req.transfer_hash
    );

    let result = state
        .exchange
        .complete_sell_transaction(&req.user_address, amount, &req.transfer_hash)
        .await;
    Ok(transaction_response(result))
}

#[get("/settlements")]
async fn list_settlements(
    state: web::Data<AppState>,
    query: web::Query<SettlementQuery>,
) -> HttpResponse {
    if query.stranded {
        success_response(state.exchange.stranded_settlements())
    } else {
        success_response(state.exchange.settlements())
    }
}

#[get("/settlements/{id}")]
async fn get_settlement(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let record = state
        .exchange
        .settlement(*id)
        .ok_or(CustomError::NotFoundError)?;
    Ok(success_response(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_amount() {
        assert_eq!(parse_token_amount("1.5").unwrap(), parse_ether("1.5").unwrap());
        assert_eq!(parse_token_amount(" 100 ").unwrap(), parse_ether("100").unwrap());
        assert!(matches!(
            parse_token_amount("0"),
            Err(CustomError::InvalidAmountError(_))
        ));
        assert!(matches!(
            parse_token_amount("one"),
            Err(CustomError::InvalidAmountError(_))
        ));
    }
}
