//! `search_properties` tool backed by the property listing REST API

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use toolbridge_core::rpc::CallToolResult;
use toolbridge_core::ToolDescriptor;

use crate::dispatch::ToolHandler;

pub const TOOL_NAME: &str = "search_properties";
pub const DEFAULT_TENANT: &str = "shopprop";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

const NO_RESULTS: &str = "No properties found matching your search criteria.";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("API_KEY environment variable not set.")]
    MissingApiKey,

    #[error("Missing required parameters: 'city' and 'state' are required.")]
    MissingLocation,

    #[error("Invalid value for '{name}': {value}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API Error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal Error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Upstream API settings
#[derive(Clone)]
pub struct PropertySearchConfig {
    pub api_base: String,
    pub tenant: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl PropertySearchConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            tenant: DEFAULT_TENANT.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for PropertySearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySearchConfig")
            .field("api_base", &self.api_base)
            .field("tenant", &self.tenant)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Validated tool arguments
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub city: String,
    pub state: String,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub size: u32,
    pub cursor: Option<String>,
}

impl SearchParams {
    pub fn from_arguments(arguments: &Value) -> Result<Self, SearchError> {
        let text = |name: &str| {
            arguments
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let (Some(city), Some(state)) = (text("city"), text("state")) else {
            return Err(SearchError::MissingLocation);
        };

        let size = integer(arguments, "size")?
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;

        Ok(Self {
            city,
            state,
            min_price: integer(arguments, "min_price")?,
            max_price: integer(arguments, "max_price")?,
            bedrooms: integer(arguments, "bedrooms")?,
            bathrooms: integer(arguments, "bathrooms")?,
            size,
            cursor: text("cursor"),
        })
    }

    /// Upstream request body
    fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("sort_by".into(), json!("last_updated_time"));
        payload.insert("order_by".into(), json!("desc"));
        payload.insert(
            "searched_address_formatted".into(),
            json!(format!("{}, {}, USA", self.city, self.state)),
        );
        payload.insert("property_status".into(), json!("SALE"));
        payload.insert("size".into(), json!(self.size));

        let filters = [
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("bedroom", self.bedrooms),
            ("bathroom", self.bathrooms),
        ];
        for (key, value) in filters {
            if let Some(value) = value {
                payload.insert(key.into(), json!(value));
            }
        }
        if let Some(cursor) = &self.cursor {
            payload.insert("cursor".into(), json!(cursor));
        }
        Value::Object(payload)
    }
}

/// Accepts JSON integers and numeric strings
fn integer(arguments: &Value, name: &'static str) -> Result<Option<i64>, SearchError> {
    let invalid = |value: &Value| SearchError::InvalidArgument {
        name,
        value: value.to_string(),
    };

    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| invalid(value)),
        Some(value @ Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(value)),
        Some(other) => Err(invalid(other)),
    }
}

/// One page of upstream results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl SearchPage {
    pub fn records(&self) -> &[Value] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Text handed back to the model
    pub fn render(&self) -> String {
        let records = self.records();
        if records.is_empty() {
            return NO_RESULTS.to_string();
        }

        let mut text = format!(
            "Found {} properties:\n\n{}",
            records.len(),
            serde_json::to_string_pretty(records).unwrap_or_default()
        );
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            text.push_str(&format!(
                "\n\nMore results available. Use cursor: `{}` for next page.",
                cursor
            ));
        }
        text
    }
}

/// Property search over the listing service
pub struct PropertySearchTool {
    config: PropertySearchConfig,
    http: reqwest::Client,
}

impl PropertySearchTool {
    pub fn new(config: PropertySearchConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &PropertySearchConfig {
        &self.config
    }

    fn endpoint(&self, params: &SearchParams) -> Result<reqwest::Url, SearchError> {
        let mut url = reqwest::Url::parse(&self.config.api_base)
            .map_err(|e| SearchError::InvalidBaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SearchError::InvalidBaseUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend([
                "tenant",
                self.config.tenant.as_str(),
                "city",
                params.city.to_lowercase().as_str(),
                "state",
                params.state.to_lowercase().as_str(),
            ]);
        Ok(url)
    }

    /// Run one search against the upstream API
    pub async fn search(&self, params: &SearchParams) -> Result<SearchPage, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SearchError::MissingApiKey)?;
        let url = self.endpoint(params)?;

        tracing::info!(
            city = %params.city,
            state = %params.state,
            size = params.size,
            "searching properties"
        );

        let response = self
            .http
            .post(url)
            .timeout(self.config.timeout)
            .header("apikey", api_key)
            .header("tenant", &self.config.tenant)
            .header("company", &self.config.tenant)
            .json(&params.payload())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(self.config.timeout)
                } else {
                    SearchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "listing API error");
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let page: SearchPage = response.json().await?;
        tracing::debug!(count = page.records().len(), "search complete");
        Ok(page)
    }
}

#[async_trait]
impl ToolHandler for PropertySearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            TOOL_NAME,
            "Search for properties for sale in a specific city and state. Returns property \
             listings with details like price, bedrooms, bathrooms, area, and images.",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name (e.g., 'Phoenix', 'Los Angeles')"},
                    "state": {"type": "string", "description": "State code (e.g., 'AZ', 'CA')"},
                    "min_price": {"type": "integer", "description": "Minimum price in USD (optional)"},
                    "max_price": {"type": "integer", "description": "Maximum price in USD (optional)"},
                    "bedrooms": {"type": "integer", "description": "Minimum number of bedrooms (optional)"},
                    "bathrooms": {"type": "integer", "description": "Minimum number of bathrooms (optional)"},
                    "size": {
                        "type": "integer",
                        "description": "Number of results to return (default: 10, max: 50)",
                        "default": DEFAULT_PAGE_SIZE
                    },
                    "cursor": {"type": "string", "description": "Pagination cursor for next page of results (optional)"}
                },
                "required": ["city", "state"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> CallToolResult {
        let result = match SearchParams::from_arguments(&arguments) {
            Ok(params) => self.search(&params).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(page) => CallToolResult::text(page.render()),
            Err(e) => {
                tracing::warn!(error = %e, "search_properties failed");
                CallToolResult::error(format!("Error: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(server: &MockServer) -> PropertySearchTool {
        PropertySearchTool::new(
            PropertySearchConfig::new(format!("{}/public", server.uri())).with_api_key("test-key"),
        )
    }

    #[test]
    fn test_params_require_location() {
        let err = SearchParams::from_arguments(&json!({"city": "Phoenix"})).unwrap_err();
        assert!(matches!(err, SearchError::MissingLocation));

        let err = SearchParams::from_arguments(&json!({"city": " ", "state": "AZ"})).unwrap_err();
        assert!(matches!(err, SearchError::MissingLocation));
    }

    #[test]
    fn test_params_coerce_and_clamp() {
        let params = SearchParams::from_arguments(&json!({
            "city": "Phoenix", "state": "AZ", "max_price": "500000", "bedrooms": 3, "size": 500
        }))
        .unwrap();
        assert_eq!(params.max_price, Some(500000));
        assert_eq!(params.bedrooms, Some(3));
        assert_eq!(params.size, MAX_PAGE_SIZE);

        let params = SearchParams::from_arguments(&json!({"city": "a", "state": "b", "size": 0})).unwrap();
        assert_eq!(params.size, 1);

        let params = SearchParams::from_arguments(&json!({"city": "a", "state": "b"})).unwrap();
        assert_eq!(params.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_params_reject_garbage_numbers() {
        let err = SearchParams::from_arguments(&json!({"city": "a", "state": "b", "min_price": "cheap"}))
            .unwrap_err();
        assert!(err.to_string().contains("min_price"));
    }

    #[test]
    fn test_render() {
        assert_eq!(SearchPage::default().render(), NO_RESULTS);

        let page = SearchPage {
            data: Some(vec![json!({"price": {"current": 420000}})]),
            cursor: Some("next-1".into()),
        };
        let text = page.render();
        assert!(text.starts_with("Found 1 properties:\n\n"));
        assert!(text.contains("420000"));
        assert!(text.ends_with("Use cursor: `next-1` for next page."));
    }

    #[tokio::test]
    async fn test_search_posts_filters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/public/tenant/shopprop/city/phoenix/state/az"))
            .and(header("apikey", "test-key"))
            .and(header("tenant", "shopprop"))
            .and(body_partial_json(json!({
                "searched_address_formatted": "Phoenix, AZ, USA",
                "property_status": "SALE",
                "max_price": 500000,
                "size": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"price": {"current": 420000}}, {"price": {"current": 480000}}],
                "cursor": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server)
            .call(json!({"city": "Phoenix", "state": "AZ", "max_price": 500000}))
            .await;

        assert!(!result.is_error);
        let text = result.joined_text();
        assert!(text.starts_with("Found 2 properties:"));
        assert!(!text.contains("More results"));
    }

    #[tokio::test]
    async fn test_city_with_spaces_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/public/tenant/shopprop/city/los%20angeles/state/ca"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server)
            .call(json!({"city": "Los Angeles", "state": "CA"}))
            .await;
        assert_eq!(result.joined_text(), NO_RESULTS);
    }

    #[tokio::test]
    async fn test_api_error_is_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let result = tool(&server).call(json!({"city": "Mesa", "state": "AZ"})).await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "Error: API Error (500): upstream exploded");
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = PropertySearchTool::new(PropertySearchConfig::new(server.uri()));
        let result = tool.call(json!({"city": "Mesa", "state": "AZ"})).await;
        assert!(result.is_error);
        assert!(result.joined_text().contains("API_KEY"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = PropertySearchConfig::new("http://x").with_api_key("secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
