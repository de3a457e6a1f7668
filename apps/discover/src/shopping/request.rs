use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request, Url};

use crate::shopping::ShoppingError;

/// Host plus headers shared by every request (API credentials).
#[derive(Debug, Clone)]
pub struct Environment {
    pub host: String,
    pub headers: BTreeMap<String, String>,
}

/// How request parameters travel.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParameters {
    /// JSON-encoded as the request body.
    Body(Option<serde_json::Value>),
    /// Appended to the path as query items.
    Url(Option<BTreeMap<String, String>>),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub path: String,
    pub method: Method,
    pub parameters: RequestParameters,
    pub headers: BTreeMap<String, String>,
}

/// Builds a ready-to-send request. Fails before any network I/O when the host,
/// path or a header can't be turned into a valid request.
pub fn prepare(
    client: &Client,
    env: &Environment,
    request: &ApiRequest,
) -> Result<Request, ShoppingError> {
    let full_url = format!(
        "{}/{}",
        env.host.trim_end_matches('/'),
        request.path.trim_start_matches('/')
    );
    let mut url = Url::parse(&full_url)
        .map_err(|e| ShoppingError::Configuration(format!("Bad URL '{full_url}': {e}")))?;

    if let RequestParameters::Url(Some(params)) = &request.parameters {
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    // request headers override environment headers with the same name
    let mut headers = HeaderMap::new();
    for (key, value) in env.headers.iter().chain(request.headers.iter()) {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ShoppingError::Configuration(format!("Bad header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ShoppingError::Configuration(format!("Bad header value for '{key}': {e}")))?;
        headers.insert(name, value);
    }

    let mut builder = client.request(request.method.clone(), url).headers(headers);
    if let RequestParameters::Body(Some(body)) = &request.parameters {
        builder = builder.json(body);
    }

    builder
        .build()
        .map_err(|e| ShoppingError::Configuration(format!("Could not build request: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(host: &str) -> Environment {
        Environment {
            host: host.to_string(),
            headers: BTreeMap::from([("X-Client-Id".to_string(), "env-id".to_string())]),
        }
    }

    fn get(params: &[(&str, &str)]) -> ApiRequest {
        ApiRequest {
            path: "v1/search/shop.json".to_string(),
            method: Method::GET,
            parameters: RequestParameters::Url(Some(
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )),
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_bad_host_is_configuration_error() {
        let err = prepare(&Client::new(), &env("not a host"), &get(&[])).unwrap_err();
        assert!(matches!(err, ShoppingError::Configuration(_)), "{err:?}");
    }

    #[test]
    fn test_url_parameters_become_query_items() {
        let request = prepare(
            &Client::new(),
            &env("https://openapi.example.com/"),
            &get(&[("query", "강아지 간식"), ("display", "20")]),
        )
        .unwrap();

        assert_eq!(request.url().path(), "/v1/search/shop.json");
        let pairs: BTreeMap<String, String> = request.url().query_pairs().into_owned().collect();
        assert_eq!(pairs.get("query").map(String::as_str), Some("강아지 간식"));
        assert_eq!(pairs.get("display").map(String::as_str), Some("20"));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_body_parameters_are_json_encoded() {
        let api_request = ApiRequest {
            path: "v1/items".to_string(),
            method: Method::POST,
            parameters: RequestParameters::Body(Some(serde_json::json!({"query": "leash"}))),
            headers: BTreeMap::new(),
        };
        let request = prepare(&Client::new(), &env("https://api.example.com"), &api_request).unwrap();

        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(body["query"], "leash");
        assert!(request.url().query().is_none());
        assert_eq!(request.method(), Method::POST);
    }

    #[test]
    fn test_request_headers_override_environment() {
        let mut api_request = get(&[]);
        api_request
            .headers
            .insert("X-Client-Id".to_string(), "request-id".to_string());
        let request = prepare(&Client::new(), &env("https://api.example.com"), &api_request).unwrap();

        let values: Vec<_> = request.headers().get_all("x-client-id").iter().collect();
        assert_eq!(values, vec!["request-id"]);
    }

    #[test]
    fn test_empty_parameters_send_nothing() {
        let api_request = ApiRequest {
            path: "ping".to_string(),
            method: Method::GET,
            parameters: RequestParameters::Url(None),
            headers: BTreeMap::new(),
        };
        let request = prepare(&Client::new(), &env("https://api.example.com"), &api_request).unwrap();
        assert!(request.url().query().is_none());
    }

    #[test]
    fn test_empty_query_map_leaves_no_question_mark() {
        let request = prepare(&Client::new(), &env("https://api.example.com"), &get(&[])).unwrap();
        assert!(request.url().query().is_none());
        assert_eq!(request.url().as_str(), "https://api.example.com/v1/search/shop.json");
    }
}
