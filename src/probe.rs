//! Ad-hoc HTTP request tester
//!
//! Sends arbitrary GET/POST requests and reports status, headers and body,
//! plus two canned demo calls: a country lookup on restcountries.com and a
//! random dog picture from dog.ceo.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Country search endpoint; the country name is appended as a path segment
pub const COUNTRIES_URL: &str = "https://restcountries.com/v3.1/name";

/// Random dog image endpoint
pub const RANDOM_DOG_URL: &str = "https://dog.ceo/api/breeds/image/random";

/// Errors that can occur while probing an endpoint
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A header name or value cannot be sent
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// User input was not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// User input was JSON but not an object
    #[error("Expected a JSON object of key/value pairs")]
    NotAnObject,

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Server reported an error in the body
    #[error("API error: {0}")]
    Api(String),
}

/// HTTP method of a probe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Post,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Get => write!(f, "GET"),
            ProbeMethod::Post => write!(f, "POST"),
        }
    }
}

/// Body sent with a POST request
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A request assembled from user input
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: ProbeBody,
}

impl ProbeRequest {
    fn new(method: ProbeMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: ProbeBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(ProbeMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(ProbeMethod::Post, url)
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: ProbeBody) -> Self {
        self.body = body;
        self
    }
}

/// Response body, parsed as JSON when possible
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => write!(f, "{pretty}"),
                Err(_) => write!(f, "{value}"),
            },
            ResponseBody::Text(text) => write!(f, "{text}"),
        }
    }
}

/// What came back from a probe request
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

/// A random dog picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct DogResponse {
    status: String,
    message: String,
}

/// Client for the request tester and the demo APIs
#[derive(Debug, Clone)]
pub struct ProbeClient {
    client: Client,
    countries_url: String,
    random_dog_url: String,
}

impl Default for ProbeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeClient {
    pub fn new() -> Self {
        Self::with_urls(COUNTRIES_URL, RANDOM_DOG_URL)
    }

    /// Creates a client with custom demo endpoints (for testing)
    pub fn with_urls(countries_url: impl Into<String>, random_dog_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            countries_url: countries_url.into().trim_end_matches('/').to_string(),
            random_dog_url: random_dog_url.into(),
        }
    }

    /// Sends `request` and captures status, headers and body
    ///
    /// Non-success statuses are returned as responses, not errors.
    pub async fn send(&self, request: &ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        debug!(method = %request.method, url = %request.url, "sending probe request");

        let builder = match request.method {
            ProbeMethod::Get => self.client.get(&request.url),
            ProbeMethod::Post => self.client.post(&request.url),
        };
        let mut builder = builder.headers(header_map(&request.headers)?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            ProbeBody::Empty => builder,
            ProbeBody::Json(value) => builder.json(value),
            ProbeBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().unwrap_or("<non-utf8>");
                (name.to_string(), value.to_string())
            })
            .collect();
        let text = response.text().await?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        };

        Ok(ProbeResponse {
            status,
            headers,
            body,
        })
    }

    /// Looks up a country by name
    pub async fn country(&self, name: &str) -> Result<ProbeResponse, ProbeError> {
        let url = format!("{}/{}", self.countries_url, urlencoded(name.trim()));
        self.send(&ProbeRequest::get(url)).await
    }

    /// Fetches a random dog picture URL
    pub async fn random_dog(&self) -> Result<DogImage, ProbeError> {
        let response = self.client.get(&self.random_dog_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let dog: DogResponse = serde_json::from_str(&response.text().await?)?;
        if dog.status != "success" {
            return Err(ProbeError::Api(dog.message));
        }

        Ok(DogImage { url: dog.message })
    }
}

/// Parses a JSON object typed at a prompt into key/value pairs
///
/// Empty input means no pairs. String values are taken verbatim, other values
/// in their JSON form.
pub fn parse_json_pairs(input: &str) -> Result<Vec<(String, String)>, ProbeError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(input)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect()),
        _ => Err(ProbeError::NotAnObject),
    }
}

/// Parses a JSON body typed at a prompt; empty input means no body
pub fn parse_json_body(input: &str) -> Result<Option<Value>, ProbeError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(input)?))
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, ProbeError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ProbeError::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ProbeError::InvalidHeader(format!("{name}: {value}")))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// URL-encodes a path segment
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}
