//! Snowflake warehouse client.
//!
//! Talks to the REST endpoints used by the official Snowflake connectors:
//! password login, statement submission with positional bindings, polling of
//! long-running statements, result chunk download and session release.

use crate::config::ConnectionConfig;
use crate::error::{DashError, Result};
use crate::warehouse::{ColumnInfo, Row, Statement, Table, Value, Warehouse, WarehouseBackend};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Application id reported to Snowflake on login.
const CLIENT_APP_ID: &str = "market-glance";

/// Timeout for a single HTTP request.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Delay between polls of a statement that is still running.
const POLL_INTERVAL_MS: u64 = 500;

/// Result chunks downloaded at the same time.
const MAX_CONCURRENT_CHUNKS: usize = 4;

/// Response codes meaning "statement still running, poll getResultUrl".
const QUERY_IN_PROGRESS_CODES: [&str; 2] = ["333333", "333334"];

/// Response code for an expired session token.
const SESSION_EXPIRED_CODE: &str = "390112";

const SNOWFLAKE_MEDIA_TYPE: &str = "application/snowflake";

/// Snowflake client holding one authenticated session.
pub struct SnowflakeWarehouse {
    http: Client,
    base_url: Url,
    /// Session token; `None` once the session is closed.
    token: Mutex<Option<String>>,
    sequence: AtomicU64,
    query_timeout: Duration,
}

impl std::fmt::Debug for SnowflakeWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("SnowflakeWarehouse")
            .field("base_url", &self.base_url.as_str())
            .field("token", &open.then_some("<redacted>"))
            .field("sequence", &self.sequence)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl SnowflakeWarehouse {
    /// Logs in with user name and password and opens a session.
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let base_url = base_url(config)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DashError::internal(format!("Failed to create HTTP client: {e}")))?;

        let account = config.account.as_deref().unwrap_or_default();
        let request = LoginRequest {
            data: LoginData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: env!("CARGO_PKG_VERSION"),
                account_name: account_name(account),
                login_name: config.user_name.as_deref().unwrap_or_default(),
                password: config.password.as_deref().unwrap_or_default(),
                session_parameters: BTreeMap::from([("QUERY_RESULT_FORMAT", "JSON")]),
            },
        };

        let mut url = join(&base_url, "/session/v1/login-request")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("request_id", &uuid::Uuid::new_v4().to_string());
            for (key, value) in [
                ("databaseName", &config.database),
                ("schemaName", &config.schema),
                ("warehouse", &config.warehouse),
                ("roleName", &config.role),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    pairs.append_pair(key, value);
                }
            }
        }

        debug!("Sending Snowflake login request");
        let response = http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let envelope: Envelope<LoginResponseData> = read_envelope(response).await?;
        if !envelope.success {
            return Err(DashError::connection(envelope.describe_failure()));
        }
        let data = envelope
            .data
            .ok_or_else(|| DashError::connection("Login response did not include a session"))?;

        info!("Snowflake session established");
        Ok(Self {
            http,
            base_url,
            token: Mutex::new(Some(data.token)),
            sequence: AtomicU64::new(0),
            query_timeout,
        })
    }

    fn auth_header(&self) -> Result<String> {
        let guard = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|token| format!("Snowflake Token=\"{token}\""))
            .ok_or_else(|| DashError::connection("Snowflake session is closed"))
    }

    /// Submits a statement and waits for its first result page.
    async fn submit(&self, statement: &Statement) -> Result<QueryData> {
        let mut url = join(&self.base_url, "/queries/v1/query-request")?;
        url.query_pairs_mut()
            .append_pair("requestId", &uuid::Uuid::new_v4().to_string());

        let request = QueryRequest {
            sql_text: statement.sql(),
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            query_submission_time: chrono::Utc::now().timestamp_millis(),
            bindings: bindings_for(statement.params()),
        };

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(ACCEPT, SNOWFLAKE_MEDIA_TYPE)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let mut envelope: Envelope<QueryData> = read_envelope(response).await?;

        while envelope.is_in_progress() {
            let result_path = envelope
                .data
                .as_ref()
                .and_then(|d| d.get_result_url.clone())
                .ok_or_else(|| DashError::query("Statement is running but no result URL was given"))?;
            debug!("Statement still running, polling {}", result_path);
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;

            let response = self
                .http
                .get(join(&self.base_url, &result_path)?)
                .header(AUTHORIZATION, self.auth_header()?)
                .header(ACCEPT, SNOWFLAKE_MEDIA_TYPE)
                .send()
                .await
                .map_err(map_transport_error)?;
            envelope = read_envelope(response).await?;
        }

        if !envelope.success {
            let message = envelope.describe_failure();
            return Err(if envelope.code().as_deref() == Some(SESSION_EXPIRED_CODE) {
                DashError::connection(message)
            } else {
                DashError::query(message)
            });
        }

        envelope
            .data
            .ok_or_else(|| DashError::query("Query response did not include data"))
    }

    /// Downloads the remaining result chunks, preserving chunk order.
    async fn download_chunks(&self, data: &QueryData) -> Result<Vec<Vec<Vec<serde_json::Value>>>> {
        if data.chunks.is_empty() {
            return Ok(Vec::new());
        }
        let headers = chunk_headers(data)?;
        debug!("Downloading {} result chunk(s)", data.chunks.len());

        let urls: Vec<String> = data.chunks.iter().map(|chunk| chunk.url.clone()).collect();
        futures::stream::iter(urls)
            .map(|url| {
                let headers = headers.clone();
                async move { self.download_chunk(&url, headers).await }
            })
            .buffered(MAX_CONCURRENT_CHUNKS)
            .try_collect()
            .await
    }

    async fn download_chunk(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Vec<Vec<serde_json::Value>>> {
        let response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashError::query(format!("Failed to read result chunk: {e}")))?;
        if !status.is_success() {
            return Err(DashError::query(format!(
                "Result chunk download failed with HTTP {status}"
            )));
        }
        parse_chunk(&body)
    }

    async fn fetch_table(&self, statement: &Statement) -> Result<Table> {
        let data = self.submit(statement).await?;

        if let Some(format) = data.query_result_format.as_deref() {
            if !format.eq_ignore_ascii_case("json") {
                return Err(DashError::query(format!(
                    "Unsupported result format '{format}'; expected JSON"
                )));
            }
        }

        let chunks = self.download_chunks(&data).await?;
        if let Some(query_id) = &data.query_id {
            debug!("Snowflake query {} returned", query_id);
        }

        let raw_rows = data
            .rowset
            .iter()
            .chain(chunks.iter().flatten())
            .collect::<Vec<_>>();
        Ok(decode_rows(&data.rowtype, raw_rows))
    }
}

#[async_trait]
impl Warehouse for SnowflakeWarehouse {
    fn backend(&self) -> WarehouseBackend {
        WarehouseBackend::Snowflake
    }

    async fn execute(&self, statement: &Statement) -> Result<Table> {
        let start = Instant::now();
        let table = tokio::time::timeout(self.query_timeout, self.fetch_table(statement))
            .await
            .map_err(|_| {
                DashError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })??;
        Ok(table.with_execution_time(start.elapsed()))
    }

    async fn close(&self) -> Result<()> {
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(token) = token else {
            return Ok(());
        };

        let mut url = join(&self.base_url, "/session")?;
        url.query_pairs_mut().append_pair("delete", "true");
        let result = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Snowflake Token=\"{token}\""))
            .header(ACCEPT, SNOWFLAKE_MEDIA_TYPE)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Snowflake session closed");
            }
            Ok(response) => warn!("Snowflake session delete returned HTTP {}", response.status()),
            Err(e) => warn!("Snowflake session delete failed: {}", e),
        }
        Ok(())
    }
}

// === Wire types ===

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    client_app_id: &'a str,
    client_app_version: &'a str,
    account_name: String,
    login_name: &'a str,
    password: &'a str,
    session_parameters: BTreeMap<&'static str, &'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponseData {
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
    async_exec: bool,
    sequence_id: u64,
    query_submission_time: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Binding {
    #[serde(rename = "type")]
    kind: &'static str,
    value: Option<String>,
}

/// Common response wrapper for every Snowflake endpoint.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

impl<T> Envelope<T> {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn is_in_progress(&self) -> bool {
        self.code()
            .is_some_and(|code| QUERY_IN_PROGRESS_CODES.contains(&code.as_str()))
    }

    fn describe_failure(&self) -> String {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| "Snowflake reported an unspecified error".to_string());
        match self.code() {
            Some(code) => format!("{message} (code {code})"),
            None => message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryData {
    rowtype: Vec<RowType>,
    rowset: Vec<Vec<serde_json::Value>>,
    chunks: Vec<ChunkInfo>,
    qrmk: Option<String>,
    chunk_headers: Option<HashMap<String, String>>,
    query_id: Option<String>,
    get_result_url: Option<String>,
    query_result_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkInfo {
    url: String,
}

// === Helpers ===

fn base_url(config: &ConnectionConfig) -> Result<Url> {
    let host = match (&config.host, &config.account) {
        (Some(host), _) if !host.is_empty() => host.clone(),
        (_, Some(account)) if !account.is_empty() => format!("{account}.snowflakecomputing.com"),
        _ => return Err(DashError::config("Snowflake connection needs an account or host")),
    };
    let raw = if host.contains("://") {
        host
    } else {
        format!("https://{host}")
    };
    Url::parse(&raw).map_err(|e| DashError::config(format!("Invalid Snowflake endpoint: {e}")))
}

/// Login expects the bare account locator, without region or cloud suffix.
fn account_name(account: &str) -> String {
    account
        .split('.')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| DashError::internal(format!("Invalid Snowflake URL path '{path}': {e}")))
}

fn map_transport_error(error: reqwest::Error) -> DashError {
    if error.is_timeout() {
        DashError::connection("Request to Snowflake timed out")
    } else if error.is_connect() {
        DashError::connection(
            "Cannot reach the Snowflake endpoint. Check the account identifier and network access.",
        )
    } else {
        DashError::connection(format!(
            "Request to Snowflake failed: {}",
            error.without_url()
        ))
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| {
            DashError::connection(format!(
                "Failed to read Snowflake response: {}",
                e.without_url()
            ))
        })?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DashError::connection(format!(
            "Snowflake rejected the session (HTTP {status})"
        )));
    }
    if !status.is_success() {
        return Err(DashError::query(format!(
            "Snowflake returned HTTP {status}"
        )));
    }

    parse_envelope(&body)
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>> {
    serde_json::from_str(body)
        .map_err(|e| DashError::query(format!("Unexpected Snowflake response: {e}")))
}

fn bindings_for(params: &[Value]) -> BTreeMap<String, Binding> {
    params
        .iter()
        .enumerate()
        .map(|(i, value)| ((i + 1).to_string(), binding_for(value)))
        .collect()
}

fn binding_for(value: &Value) -> Binding {
    let (kind, value) = match value {
        Value::Null => ("TEXT", None),
        Value::Bool(b) => ("BOOLEAN", Some(b.to_string())),
        Value::Int(i) => ("FIXED", Some(i.to_string())),
        Value::Float(f) => ("REAL", Some(f.to_string())),
        Value::String(s) => ("TEXT", Some(s.clone())),
        Value::Date(d) => {
            let millis = d.signed_duration_since(epoch()).num_days() * 86_400_000;
            ("DATE", Some(millis.to_string()))
        }
        Value::Timestamp(t) => {
            let nanos = t.and_utc().timestamp_nanos_opt().unwrap_or_default();
            ("TIMESTAMP_NTZ", Some(nanos.to_string()))
        }
        Value::Bytes(b) => ("BINARY", Some(b.iter().map(|x| format!("{x:02X}")).collect())),
    };
    Binding { kind, value }
}

fn chunk_headers(data: &QueryData) -> Result<HeaderMap> {
    let pairs: Vec<(String, String)> = match (&data.chunk_headers, &data.qrmk) {
        (Some(headers), _) if !headers.is_empty() => headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        (_, Some(qrmk)) => vec![
            (
                "x-amz-server-side-encryption-customer-algorithm".to_string(),
                "AES256".to_string(),
            ),
            (
                "x-amz-server-side-encryption-customer-key".to_string(),
                qrmk.clone(),
            ),
        ],
        _ => Vec::new(),
    };

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DashError::query(format!("Invalid chunk header name: {e}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| DashError::query(format!("Invalid chunk header value: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Parses a result chunk body: row arrays separated by commas, without the
/// enclosing brackets.
fn parse_chunk(body: &str) -> Result<Vec<Vec<serde_json::Value>>> {
    let trimmed = body.trim().trim_end_matches(',');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&format!("[{trimmed}]"))
        .map_err(|e| DashError::query(format!("Malformed result chunk: {e}")))
}

fn decode_rows(rowtype: &[RowType], raw_rows: Vec<&Vec<serde_json::Value>>) -> Table {
    let columns = rowtype
        .iter()
        .map(|c| ColumnInfo::new(c.name.clone(), c.kind.clone()))
        .collect();

    let rows: Vec<Row> = raw_rows
        .into_iter()
        .map(|raw| {
            rowtype
                .iter()
                .enumerate()
                .map(|(i, column)| decode_cell(raw.get(i), column))
                .collect()
        })
        .collect();

    Table::with_data(columns, rows)
}

fn decode_cell(raw: Option<&serde_json::Value>, column: &RowType) -> Value {
    let text = match raw {
        None | Some(serde_json::Value::Null) => return Value::Null,
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let decoded = match column.kind.to_ascii_lowercase().as_str() {
        "fixed" => match column.scale.unwrap_or(0) {
            0 => text
                .parse::<i64>()
                .map(Value::Int)
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(Value::Float)),
            _ => text.parse::<f64>().ok().map(Value::Float),
        },
        "real" => text.parse::<f64>().ok().map(Value::Float),
        "boolean" => match text.as_str() {
            "1" | "true" | "TRUE" => Some(Value::Bool(true)),
            "0" | "false" | "FALSE" => Some(Value::Bool(false)),
            _ => None,
        },
        "date" => text
            .parse::<i64>()
            .ok()
            .and_then(|days| epoch().checked_add_signed(chrono::Duration::days(days)))
            .map(Value::Date),
        "timestamp_ntz" | "timestamp_ltz" | "timestamp_tz" => parse_epoch_seconds(&text),
        "binary" => decode_hex(&text).map(Value::Bytes),
        _ => None,
    };

    decoded.unwrap_or(Value::String(text))
}

/// Parses `seconds.fraction`, optionally followed by a zone offset (which is
/// ignored; the value is reported in UTC).
fn parse_epoch_seconds(text: &str) -> Option<Value> {
    let number = text.split_whitespace().next()?;
    let (secs, frac) = number.split_once('.').unwrap_or((number, "0"));
    let secs: i64 = secs.parse().ok()?;
    let mut frac = frac.to_string();
    frac.truncate(9);
    while frac.len() < 9 {
        frac.push('0');
    }
    let nanos: u32 = frac.parse().ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| Value::Timestamp(dt.naive_utc()))
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}
