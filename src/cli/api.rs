//! Thin client for the remote action endpoint.
//!
//! Every call hits the same URL. Reads are `GET ?action=..&token=..`, writes are
//! `POST` with a JSON body carrying `action`, the token and the payload fields.
//! POST bodies go out as `text/plain` so script hosts treat them as simple
//! requests.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AuthResponse, Budget, Expense, NewExpense};

const POST_CONTENT_TYPE: &str = "text/plain;charset=utf-8";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const FALLBACK_MESSAGE: &str = "Request failed";
// Script hosts answer writes with a redirect to the result.
const MAX_REDIRECTS: usize = 10;

/// Message the endpoint uses when the user has not saved a budget yet.
pub const NO_BUDGET_MESSAGE: &str = "No budget found";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint answered with an error message or a failing status.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Remote { message, .. }
            if message.to_lowercase().contains("invalid token"))
    }

    pub fn is_no_budget(&self) -> bool {
        matches!(self, Self::Remote { message, .. } if message == NO_BUDGET_MESSAGE)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============= Auth =============

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let data = self
            .post("register", None, &Credentials { email, password })
            .await?;
        decode(data)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let data = self
            .post("login", None, &Credentials { email, password })
            .await?;
        decode(data)
    }

    // ============= Budget =============

    pub async fn get_budget(&self, token: &str) -> Result<Budget, ApiError> {
        let data = self.get("getBudget", token).await?;
        budget_from(data)
    }

    pub async fn save_budget(&self, token: &str, budget: &Budget) -> Result<Budget, ApiError> {
        let data = self.post("saveBudget", Some(token), budget).await?;
        budget_from(data)
    }

    // ============= Expenses =============

    pub async fn get_expenses(&self, token: &str) -> Result<Vec<Expense>, ApiError> {
        let data = self.get("getExpenses", token).await?;
        match unwrap_field(data, "expenses") {
            Value::Null => Ok(Vec::new()),
            list => decode(list),
        }
    }

    pub async fn add_expense(&self, token: &str, expense: &NewExpense) -> Result<Expense, ApiError> {
        let data = self.post("addExpense", Some(token), expense).await?;
        decode(unwrap_field(data, "expense"))
    }

    // ============= Transport =============

    async fn get(&self, action: &str, token: &str) -> Result<Value, ApiError> {
        debug!(action, "GET");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("action", action), ("token", token)])
            .send()
            .await?;
        read_response(action, response).await
    }

    async fn post<P: Serialize>(
        &self,
        action: &str,
        token: Option<&str>,
        payload: &P,
    ) -> Result<Value, ApiError> {
        debug!(action, "POST");
        let body = envelope(action, token, payload)?;
        let response = self
            .http
            .post(&self.base_url)
            .header(CONTENT_TYPE, POST_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await?;
        read_response(action, response).await
    }
}

/// `{ action, token?, ...payload }`
fn envelope<P: Serialize>(action: &str, token: Option<&str>, payload: &P) -> Result<Value, ApiError> {
    let mut body = Map::new();
    body.insert("action".to_string(), Value::from(action));
    if let Some(token) = token {
        body.insert("token".to_string(), Value::from(token));
    }
    if let Value::Object(fields) = serde_json::to_value(payload)? {
        body.extend(fields);
    }
    Ok(Value::Object(body))
}

async fn read_response(action: &str, response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    // An unreadable body counts as an empty object.
    let data = serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Map::new()));

    let result = classify(status, data);
    match &result {
        Ok(_) => debug!(action, status = status.as_u16(), "request ok"),
        Err(e) => warn!(action, status = status.as_u16(), error = %e, "request failed"),
    }
    result
}

/// Turns a status and parsed body into either the body or an error.
pub fn classify(status: StatusCode, data: Value) -> Result<Value, ApiError> {
    let error = data.get("error").and_then(error_text);
    if !status.is_success() {
        return Err(ApiError::Remote {
            status: status.as_u16(),
            message: error.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        });
    }
    if let Some(message) = error {
        return Err(ApiError::Remote {
            status: status.as_u16(),
            message,
        });
    }
    Ok(data)
}

/// Falsy values (`null`, `false`, `0`, `""`) carry no error.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `{ key: X }` becomes `X`; any other shape is returned as is.
pub fn unwrap_field(data: Value, key: &str) -> Value {
    match data {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

fn budget_from(data: Value) -> Result<Budget, ApiError> {
    match unwrap_field(data, "budget") {
        Value::Null => Err(ApiError::Remote {
            status: StatusCode::OK.as_u16(),
            message: NO_BUDGET_MESSAGE.to_string(),
        }),
        budget => decode(budget),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}
