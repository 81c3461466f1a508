use actix_web::web;

use crate::services::{
    catalog_service::CatalogService, exchange_service::ExchangeService,
    price_service::PriceService,
};

mod catalog_handlers;
mod handlers;

pub struct AppState {
    pub exchange: ExchangeService,
    pub catalog: CatalogService,
    pub prices: PriceService,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::validate_config)
            .service(handlers::faucet_status)
            .service(handlers::get_balances)
            .service(handlers::claim_with_payment)
            .service(handlers::claim_free)
            .service(handlers::sell_validate)
            .service(handlers::sell_complete)
            .service(handlers::list_settlements)
            .service(handlers::get_settlement)
            .service(catalog_handlers::token_stats)
            .service(catalog_handlers::list_tokens)
            .service(catalog_handlers::native_price),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::tests::test_config,
        errors::CustomError,
        models::token::Balance,
        services::chain::{
            BalanceReader, ReceiptStatus, ReceiptWaiter, TokenTransfer, TransferSubmitter,
            WalletFactory,
        },
    };
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use ethers::types::{Address, TxHash};
    use serde_json::Value;
    use std::{sync::Arc, time::Duration};

    /// Chain that is never reached by the requests under test.
    struct UnreachableChain;

    #[async_trait]
    impl BalanceReader for UnreachableChain {
        async fn native_balance(&self, _address: Address) -> Result<Balance, CustomError> {
            Err(CustomError::NetworkError("offline".to_string()))
        }

        async fn token_balance(
            &self,
            _token: Address,
            _owner: Address,
        ) -> Result<Balance, CustomError> {
            Err(CustomError::NetworkError("offline".to_string()))
        }
    }

    #[async_trait]
    impl ReceiptWaiter for UnreachableChain {
        async fn wait_for_receipt(
            &self,
            _hash: TxHash,
            timeout: Duration,
        ) -> Result<ReceiptStatus, CustomError> {
            Err(CustomError::TransactionTimeout(timeout.as_secs()))
        }

        async fn token_transfers(&self, _hash: TxHash) -> Result<Vec<TokenTransfer>, CustomError> {
            Err(CustomError::NetworkError("unreachable".to_string()))
        }
    }

    impl WalletFactory for UnreachableChain {
        fn custodial_wallet(
            &self,
            _signing_key: &str,
        ) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
            Err(CustomError::NetworkError("offline".to_string()))
        }

        fn user_payment(
            &self,
            _signed_payment: &str,
            _user: Address,
        ) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
            Err(CustomError::NetworkError("offline".to_string()))
        }
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            exchange: ExchangeService::new(test_config(), Arc::new(UnreachableChain)).unwrap(),
            catalog: CatalogService::load().unwrap(),
            prices: PriceService::new(None, "avalanche-2".to_string()),
        })
    }

    #[actix_web::test]
    async fn test_config_validate_endpoint() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get().uri("/api/v1/config/validate").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(body["result"]["valid"], true);
    }

    #[actix_web::test]
    async fn test_list_tokens_with_search() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/tokens?search=pika&sort_by=name&order=asc")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let tokens = body["result"].as_array().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0]["symbol"], "PIKA");
    }

    #[actix_web::test]
    async fn test_token_stats() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get().uri("/api/v1/tokens/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"]["top_gainer"]["symbol"], "MEW2");
        assert_eq!(body["result"]["top_loser"]["symbol"], "SQRT");
    }

    #[actix_web::test]
    async fn test_bad_amount_is_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/sell/validate")
            .set_json(serde_json::json!({
                "user_address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "amount": "lots"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_failed_claim_is_unprocessable() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/claim/free")
            .set_json(serde_json::json!({ "user_address": "0x1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "FAILURE");
        assert_eq!(body["result"]["success"], false);
        assert_eq!(body["result"]["error_reason"], "Invalid address: 0x1");
    }

    #[actix_web::test]
    async fn test_invalid_balance_address() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get().uri("/api/v1/balances/0x12").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_settlements_start_empty() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get().uri("/api/v1/settlements").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_stranded_filter_and_unknown_settlement() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/settlements?stranded=true")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"].as_array().unwrap().len(), 0);

        let req = test::TestRequest::get()
            .uri("/api/v1/settlements/6f9619ff-8b86-d011-b42d-00c04fc964ff")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
