use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::shopping::request::{prepare, ApiRequest, Environment, RequestParameters};
use crate::shopping::{ShoppingError, ShoppingGateway, ShoppingPage, ShoppingQuery};

const SEARCH_PATH: &str = "v1/search/shop.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_message: String,
}

/// Marketplace search over HTTP. Single attempt per call; callers decide
/// whether a failed term is worth retrying.
#[derive(Clone)]
pub struct ShoppingClient {
    client: Client,
    env: Environment,
}

impl ShoppingClient {
    pub fn new(
        host: String,
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self, ShoppingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShoppingError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        let env = Environment {
            host,
            headers: BTreeMap::from([
                ("X-Naver-Client-Id".to_string(), client_id),
                ("X-Naver-Client-Secret".to_string(), client_secret),
            ]),
        };
        Ok(Self { client, env })
    }

    fn search_request(query: &ShoppingQuery) -> ApiRequest {
        let params = BTreeMap::from([
            ("query".to_string(), query.query.clone()),
            ("display".to_string(), query.display.to_string()),
            ("start".to_string(), query.start.to_string()),
            ("sort".to_string(), query.sort.as_str().to_string()),
        ]);
        ApiRequest {
            path: SEARCH_PATH.to_string(),
            method: Method::GET,
            parameters: RequestParameters::Url(Some(params)),
            headers: BTreeMap::new(),
        }
    }
}

#[async_trait]
impl ShoppingGateway for ShoppingClient {
    async fn search(&self, query: &ShoppingQuery) -> Result<ShoppingPage, ShoppingError> {
        let request = prepare(&self.client, &self.env, &Self::search_request(query))?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error_message)
                .unwrap_or(body);
            warn!("Shopping API returned {status} for '{}': {message}", query.query);
            return Err(ShoppingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let page: ShoppingPage = serde_json::from_str(&body)?;
        debug!(
            "Shopping search '{}' returned {} of {} items",
            query.query,
            page.items.len(),
            page.total
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopping::ShoppingSort;

    #[test]
    fn test_search_request_carries_query_parameters() {
        let request = ShoppingClient::search_request(&ShoppingQuery {
            query: "고양이 모래".to_string(),
            display: 20,
            start: 1,
            sort: ShoppingSort::Date,
        });
        let RequestParameters::Url(Some(params)) = request.parameters else {
            panic!("expected url parameters");
        };
        assert_eq!(params["query"], "고양이 모래");
        assert_eq!(params["display"], "20");
        assert_eq!(params["start"], "1");
        assert_eq!(params["sort"], "date");
    }

    #[test]
    fn test_client_sends_credentials_as_headers() {
        let client = ShoppingClient::new(
            "https://openapi.naver.com".to_string(),
            "id".to_string(),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let request = prepare(
            &client.client,
            &client.env,
            &ShoppingClient::search_request(&ShoppingQuery::first_page("leash")),
        )
        .unwrap();
        assert_eq!(request.headers()["x-naver-client-id"], "id");
        assert_eq!(request.headers()["x-naver-client-secret"], "secret");
        assert_eq!(
            request.url().as_str().split('?').next(),
            Some("https://openapi.naver.com/v1/search/shop.json")
        );
    }
}
