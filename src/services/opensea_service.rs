// src/services/opensea_service.rs
use crate::config::OpenSeaConfig;
use crate::errors::PromptMintError;
use crate::models::*;
use alloy_primitives::U256;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const PRICE_DECIMALS: u32 = 18;
const PRICE_CURRENCY: &str = "ETH";

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    orders: Vec<OrderEntry>,
}

#[derive(Debug, Deserialize)]
struct OrderEntry {
    order_hash: Option<String>,
    current_price: String,
    maker: Option<AccountRef>,
    expiration_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AccountRef {
    address: String,
}

#[derive(Debug, Deserialize)]
struct NftResponse {
    nft: NftEntry,
}

#[derive(Debug, Deserialize)]
struct NftEntry {
    identifier: String,
    collection: Option<String>,
    contract: Option<String>,
    name: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    metadata_url: Option<String>,
    opensea_url: Option<String>,
    #[serde(default)]
    owners: Vec<AccountRef>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    total: StatsTotal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatsTotal {
    volume: f64,
    sales: u64,
    average_price: f64,
    num_owners: u64,
    market_cap: f64,
    floor_price: Option<f64>,
    floor_price_symbol: Option<String>,
}

pub struct OpenSeaService {
    config: OpenSeaConfig,
    client: Client,
}

impl OpenSeaService {
    pub fn new(config: OpenSeaConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub async fn get_highest_offer(
        &self,
        contract: &str,
        token_id: &str,
        chain: Chain,
    ) -> Result<Option<Offer>, PromptMintError> {
        let url = format!(
            "{}/orders/{}/seaport/offers",
            self.config.base_url(chain),
            chain
        );
        let request = self.client.get(url).query(&[
            ("asset_contract_address", contract),
            ("token_ids", token_id),
            ("order_by", "eth_price"),
            ("order_direction", "desc"),
            ("limit", "1"),
        ]);

        let Some(response) = self.fetch::<OffersResponse>(request).await? else {
            return Ok(None);
        };

        let Some(order) = response.orders.into_iter().next() else {
            debug!("No offers for {}/{} on {}", contract, token_id, chain);
            return Ok(None);
        };

        let formatted_price = format_price(&order.current_price, PRICE_DECIMALS, PRICE_CURRENCY)?;

        Ok(Some(Offer {
            order_hash: order.order_hash,
            price_wei: order.current_price,
            formatted_price,
            maker: order.maker.map(|m| m.address),
            expiration_time: order.expiration_time,
            chain,
        }))
    }

    pub async fn get_asset_details(
        &self,
        contract: &str,
        token_id: &str,
        chain: Chain,
    ) -> Result<Option<AssetDetails>, PromptMintError> {
        let url = format!(
            "{}/chain/{}/contract/{}/nfts/{}",
            self.config.base_url(chain),
            chain,
            contract,
            token_id
        );

        Ok(self
            .fetch::<NftResponse>(self.client.get(url))
            .await?
            .map(|response| {
                let nft = response.nft;
                AssetDetails {
                    identifier: nft.identifier,
                    collection: nft.collection,
                    contract: nft.contract,
                    name: nft.name,
                    description: nft.description,
                    image_url: nft.image_url,
                    metadata_url: nft.metadata_url,
                    opensea_url: nft.opensea_url,
                    owners: nft.owners.into_iter().map(|o| o.address).collect(),
                }
            }))
    }

    pub async fn get_collection_stats(
        &self,
        slug: &str,
        chain: Chain,
    ) -> Result<Option<CollectionStats>, PromptMintError> {
        let url = format!("{}/collections/{}/stats", self.config.base_url(chain), slug);

        Ok(self
            .fetch::<StatsResponse>(self.client.get(url))
            .await?
            .map(|response| {
                let total = response.total;
                CollectionStats {
                    volume: total.volume,
                    sales: total.sales,
                    average_price: total.average_price,
                    num_owners: total.num_owners,
                    market_cap: total.market_cap,
                    floor_price: total.floor_price,
                    floor_price_symbol: total.floor_price_symbol,
                }
            }))
    }

    /// `Ok(None)` on 404, typed error on anything else that is not a success.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, PromptMintError> {
        let mut request = request.header("Accept", "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.header("X-API-KEY", api_key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("OpenSea request failed: {}", e);
            PromptMintError::Marketplace {
                message: format!("OpenSea request failed: {}", e),
                status: None,
                code: None,
                source: Some(e),
            }
        })?;

        let status = response.status();
        info!("OpenSea {} -> {}", response.url().path(), status.as_u16());

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("OpenSea returned {}: {}", status.as_u16(), error_text);
            return Err(PromptMintError::marketplace(
                format!("OpenSea API error ({}): {}", status.as_u16(), error_text),
                Some(status.as_u16()),
            ));
        }

        response.json::<T>().await.map(Some).map_err(|e| {
            PromptMintError::marketplace(
                format!("Failed to parse OpenSea response: {}", e),
                Some(status.as_u16()),
            )
        })
    }
}

/// Renders an integer amount of base units with exactly six fractional
/// digits, rounding half up: `300000000000000` at 18 decimals is
/// `"0.000300 ETH"`.
pub fn format_price(value: &str, decimals: u32, currency: &str) -> Result<String, PromptMintError> {
    let invalid = || PromptMintError::marketplace(format!("Invalid price value: {}", value), None);

    let value: U256 = value.trim().parse().map_err(|_| invalid())?;
    let ten = U256::from(10u64);
    let scale = ten.pow(U256::from(6u64));
    let divisor = ten
        .checked_pow(U256::from(decimals))
        .ok_or_else(invalid)?;

    let scaled = value.checked_mul(scale).ok_or_else(invalid)?;
    let rounded = scaled
        .checked_add(divisor / U256::from(2u64))
        .ok_or_else(invalid)?
        / divisor;
    let whole = rounded / scale;
    let fraction = rounded % scale;

    Ok(format!(
        "{}.{:0>6} {}",
        whole,
        fraction.to_string(),
        currency
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockServer;
    use serde_json::json;

    fn service(server: &MockServer) -> OpenSeaService {
        OpenSeaService::new(OpenSeaConfig::new().with_base_url(&server.base_url))
    }

    const CONTRACT: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn formats_prices_with_six_decimals() {
        assert_eq!(
            format_price("1000000000000000000", 18, "ETH").unwrap(),
            "1.000000 ETH"
        );
        assert_eq!(
            format_price("300000000000000", 18, "ETH").unwrap(),
            "0.000300 ETH"
        );
        assert_eq!(format_price("0", 18, "ETH").unwrap(), "0.000000 ETH");
        assert_eq!(
            format_price("123456789000000000000", 18, "WETH").unwrap(),
            "123.456789 WETH"
        );
        assert_eq!(format_price("2500000", 6, "USDC").unwrap(), "2.500000 USDC");
        assert_eq!(format_price("15", 0, "X").unwrap(), "15.000000 X");
    }

    #[test]
    fn rounds_half_up_at_sixth_digit() {
        assert_eq!(
            format_price("1234567500000", 18, "ETH").unwrap(),
            "0.000001 ETH"
        );
        assert_eq!(
            format_price("999999500000000000", 18, "ETH").unwrap(),
            "1.000000 ETH"
        );
    }

    #[test]
    fn format_is_stable_across_calls() {
        let first = format_price("300000000000000", 18, "ETH").unwrap();
        let second = format_price("300000000000000", 18, "ETH").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_non_numeric_price() {
        assert!(format_price("abc", 18, "ETH").is_err());
    }

    #[test]
    fn rejects_prices_that_overflow_while_rounding() {
        let near_max = (U256::MAX / U256::from(1_000_000u64)).to_string();
        assert!(matches!(
            format_price(&near_max, 18, "ETH"),
            Err(PromptMintError::Marketplace { .. })
        ));
        assert!(format_price("1", 78, "ETH").is_err());
        assert!(format_price(&U256::MAX.to_string(), 18, "ETH").is_err());
    }

    #[actix_web::test]
    async fn highest_offer_builds_orderbook_query() {
        let server = MockServer::json(
            200,
            json!({ "orders": [{
                "order_hash": "0xabc",
                "current_price": "300000000000000",
                "maker": { "address": "0xmaker" },
                "expiration_time": 1_800_000_000i64
            }] }),
        );
        let opensea = OpenSeaService::new(
            OpenSeaConfig::new()
                .with_base_url(&server.base_url)
                .with_api_key("os-key"),
        );

        let offer = opensea
            .get_highest_offer(CONTRACT, "7", Chain::Sepolia)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(offer.formatted_price, "0.000300 ETH");
        assert_eq!(offer.price_wei, "300000000000000");
        assert_eq!(offer.maker.as_deref(), Some("0xmaker"));
        assert_eq!(offer.order_hash.as_deref(), Some("0xabc"));

        let request = &server.requests()[0];
        assert_eq!(request.path, "/orders/sepolia/seaport/offers");
        assert_eq!(request.header("x-api-key"), Some("os-key"));
        for part in [
            format!("asset_contract_address={}", CONTRACT),
            "token_ids=7".to_string(),
            "order_by=eth_price".to_string(),
            "order_direction=desc".to_string(),
            "limit=1".to_string(),
        ] {
            assert!(request.query.contains(&part), "missing {}", part);
        }
    }

    #[actix_web::test]
    async fn omits_api_key_header_when_not_configured() {
        let server = MockServer::json(200, json!({ "orders": [] }));
        service(&server)
            .get_highest_offer(CONTRACT, "1", Chain::Ethereum)
            .await
            .unwrap();
        assert_eq!(server.requests()[0].header("x-api-key"), None);
    }

    #[actix_web::test]
    async fn empty_orderbook_is_none() {
        let server = MockServer::json(200, json!({ "orders": [] }));
        let offer = service(&server)
            .get_highest_offer(CONTRACT, "1", Chain::Ethereum)
            .await
            .unwrap();
        assert!(offer.is_none());
    }

    #[actix_web::test]
    async fn not_found_is_none() {
        let server = MockServer::json(404, json!({ "errors": ["not found"] }));
        let offer = service(&server)
            .get_highest_offer(CONTRACT, "1", Chain::Ethereum)
            .await
            .unwrap();
        assert!(offer.is_none());
    }

    #[actix_web::test]
    async fn server_error_is_typed() {
        let server = MockServer::start(500, "internal");
        let err = service(&server)
            .get_highest_offer(CONTRACT, "1", Chain::Ethereum)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "marketplace_error");
        assert_eq!(err.status(), Some(500));
    }

    #[actix_web::test]
    async fn asset_and_stats_server_errors_are_typed() {
        let server = MockServer::start(500, "internal");
        let opensea = service(&server);

        let err = opensea
            .get_asset_details(CONTRACT, "7", Chain::Ethereum)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "marketplace_error");
        assert_eq!(err.status(), Some(500));

        let err = opensea
            .get_collection_stats("promptmint", Chain::Ethereum)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "marketplace_error");
        assert_eq!(err.status(), Some(500));
    }

    #[actix_web::test]
    async fn transport_failure_is_typed() {
        let opensea =
            OpenSeaService::new(OpenSeaConfig::new().with_base_url("http://127.0.0.1:1"));
        let err = opensea
            .get_collection_stats("promptmint", Chain::Ethereum)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "marketplace_error");
        assert_eq!(err.status(), None);
    }

    #[actix_web::test]
    async fn asset_details_are_mapped() {
        let server = MockServer::json(
            200,
            json!({ "nft": {
                "identifier": "7",
                "collection": "promptmint",
                "contract": CONTRACT,
                "name": "PromptMint #7",
                "image_url": "https://img.example/7.jpg",
                "owners": [{ "address": "0xowner", "quantity": 1 }]
            } }),
        );

        let asset = service(&server)
            .get_asset_details(CONTRACT, "7", Chain::Ethereum)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(asset.identifier, "7");
        assert_eq!(asset.name.as_deref(), Some("PromptMint #7"));
        assert_eq!(asset.owners, vec!["0xowner"]);
        assert_eq!(asset.description, None);
        assert_eq!(
            server.requests()[0].path,
            format!("/chain/ethereum/contract/{}/nfts/7", CONTRACT)
        );
    }

    #[actix_web::test]
    async fn asset_details_not_found_is_none() {
        let server = MockServer::start(404, "");
        let asset = service(&server)
            .get_asset_details(CONTRACT, "99", Chain::Sepolia)
            .await
            .unwrap();
        assert!(asset.is_none());
    }

    #[actix_web::test]
    async fn collection_stats_are_mapped() {
        let server = MockServer::json(
            200,
            json!({ "total": {
                "volume": 12.5,
                "sales": 40,
                "average_price": 0.3125,
                "num_owners": 21,
                "market_cap": 9.0,
                "floor_price": 0.0003,
                "floor_price_symbol": "ETH"
            }, "intervals": [] }),
        );

        let stats = service(&server)
            .get_collection_stats("promptmint", Chain::Ethereum)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stats.sales, 40);
        assert_eq!(stats.num_owners, 21);
        assert_eq!(stats.floor_price, Some(0.0003));
        assert_eq!(server.requests()[0].path, "/collections/promptmint/stats");
    }
}
