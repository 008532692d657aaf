//! HTTP client implementation for NotLocalStorage

use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Endpoint base of the hosted NotLocalStorage service.
pub const DEFAULT_ENDPOINT: &str = "https://stg001.notlocalstorage.io/api/data/";

/// Environment variable consulted when no API key is given explicitly.
pub const API_KEY_VAR: &str = "NLS_API_KEY";

/// Environment variable consulted when no app key is given explicitly.
pub const APP_KEY_VAR: &str = "NLS_APP_KEY";

const DEFAULT_TIMEOUT_MS: u64 = 30000;

/// Configuration options for the NotLocalStorage client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint base URL under which the `get/` and `store/` operation paths
    /// are built. Must end with a slash. Defaults to the hosted service.
    pub endpoint: String,
    /// API key, embedded as the first credential path segment
    pub api_key: String,
    /// Application key, embedded as the second credential path segment
    pub app_key: String,
    /// Request timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            app_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Resolve credentials from explicit arguments with environment fallback.
    ///
    /// An explicit argument wins; a `None` argument falls back to the
    /// corresponding environment variable ([`API_KEY_VAR`] / [`APP_KEY_VAR`]).
    /// When neither source has a value this fails with
    /// [`Error::MissingCredential`] naming the variable, so a malformed
    /// credential segment can never reach the wire.
    ///
    /// # Example
    /// ```rust,no_run
    /// use nls_client::ClientConfig;
    ///
    /// // API key from the caller, app key from NLS_APP_KEY
    /// let config = ClientConfig::resolve(Some("your-api-key"), None)?;
    /// # Ok::<(), nls_client::Error>(())
    /// ```
    pub fn resolve(api_key: Option<&str>, app_key: Option<&str>) -> Result<Self> {
        let api_key = resolve_credential(api_key, API_KEY_VAR)?;
        let app_key = resolve_credential(app_key, APP_KEY_VAR)?;
        Ok(Self {
            api_key,
            app_key,
            ..Default::default()
        })
    }
}

fn resolve_credential(explicit: Option<&str>, var: &'static str) -> Result<String> {
    let value = match explicit {
        Some(v) => v.to_string(),
        None => env::var(var).map_err(|_| Error::MissingCredential(var))?,
    };
    if value.is_empty() {
        return Err(Error::MissingCredential(var));
    }
    Ok(value)
}

/// Build a rustls ClientConfig with standard CA verification.
fn build_tls_config() -> Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// Async client for the NotLocalStorage service
///
/// Each [`load`](Client::load) or [`save`](Client::save) call issues exactly
/// one HTTP request and resolves to the response body or a typed error. Any
/// number of calls may be in flight concurrently; the configuration is
/// immutable once the client is built, so concurrent requests always see a
/// consistent credential set. The client is cheap to clone and all clones
/// share one connection pool.
///
/// # Example
/// ```rust,no_run
/// use nls_client::{Client, ClientConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), nls_client::Error> {
///     // Explicit credentials against the hosted service
///     let client = Client::new("your-api-key", "your-app-key")?;
///
///     // Credentials from NLS_API_KEY / NLS_APP_KEY
///     let client = Client::from_env()?;
///
///     // Full control, e.g. a self-hosted endpoint
///     let client = Client::with_config(ClientConfig {
///         endpoint: "http://localhost:3000/api/data/".to_string(),
///         api_key: "your-api-key".to_string(),
///         app_key: "your-app-key".to_string(),
///         ..Default::default()
///     })?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http_client: HttpClient<HttpsConnector, Full<Bytes>>,
}

impl Client {
    /// Create a client with explicit credentials and the default endpoint
    ///
    /// # Errors
    /// Returns an error if either credential is empty
    pub fn new(api_key: &str, app_key: &str) -> Result<Self> {
        let config = ClientConfig {
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create a client with both credentials taken from the environment
    ///
    /// # Errors
    /// Returns [`Error::MissingCredential`] if [`API_KEY_VAR`] or
    /// [`APP_KEY_VAR`] is unset
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::resolve(None, None)?)
    }

    /// Create a client with custom configuration
    ///
    /// # Errors
    /// Returns an error if the endpoint URL is invalid or a credential is
    /// empty
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        // Validate the endpoint URL early
        let _: Uri = config
            .endpoint
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid endpoint URL: {}", e)))?;

        // Operation paths are appended by plain concatenation
        if !config.endpoint.ends_with('/') {
            return Err(Error::InvalidUrl(format!(
                "Endpoint base must end with a slash: {}",
                config.endpoint
            )));
        }

        if config.api_key.is_empty() {
            return Err(Error::MissingCredential(API_KEY_VAR));
        }
        if config.app_key.is_empty() {
            return Err(Error::MissingCredential(APP_KEY_VAR));
        }

        let tls_config = build_tls_config()?;

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_all_versions()
            .build();

        let http_client = HttpClient::builder(TokioExecutor::new()).build(https_connector);

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Get the endpoint base URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Get the application key
    pub fn app_key(&self) -> &str {
        &self.config.app_key
    }

    /// Build the request URL for an operation verb and index key.
    ///
    /// Plain concatenation, exactly as the service expects:
    /// `{endpoint}{verb}/{api_key}/{app_key}/{index_key}`. The key is not
    /// percent-encoded or validated beyond being non-empty, so keys carrying
    /// URI-structural characters are the caller's responsibility.
    fn operation_url(&self, verb: &str, index_key: &str) -> Result<Uri> {
        if index_key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let url = format!(
            "{}{}/{}/{}/{}",
            self.config.endpoint, verb, self.config.api_key, self.config.app_key, index_key
        );
        url.parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid request URL: {}", e)))
    }

    /// Internal request method
    async fn dispatch(&self, method: Method, uri: Uri, body: Bytes) -> Result<Bytes> {
        let req = Request::builder()
            .method(method.clone())
            .uri(uri.clone())
            .body(Full::new(body))
            .map_err(|e| Error::InvalidRequest(format!("Failed to build request: {}", e)))?;

        debug!("Sending request: {} {}", method, uri.path());

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let response = tokio::time::timeout(timeout, self.http_client.request(req))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout_ms))?
            .map_err(|e| Error::Connection(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = Self::read_body_to_bytes(response.into_body()).await?;

        if !status.is_success() {
            return Err(Error::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
                message: String::from_utf8_lossy(&body).to_string(),
            });
        }

        Ok(body)
    }

    /// Read response body to bytes
    async fn read_body_to_bytes(body: Incoming) -> Result<Bytes> {
        let collected = body
            .collect()
            .await
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        Ok(collected.to_bytes())
    }

    /// Retrieve the value stored under an index key
    ///
    /// Issues a single GET to `{endpoint}get/{api_key}/{app_key}/{index_key}`
    /// and returns the response body verbatim.
    ///
    /// # Errors
    /// [`Error::EmptyKey`] for an empty key (nothing is dispatched),
    /// [`Error::Status`] for any non-success response including 404,
    /// [`Error::Connection`] / [`Error::Timeout`] for transport failures
    ///
    /// # Example
    /// ```rust,no_run
    /// # use nls_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), nls_client::Error> {
    /// # let client = Client::new("api-key", "app-key")?;
    /// let value = client.load("user-preferences").await?;
    /// println!("{}", String::from_utf8_lossy(&value));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(&self, index_key: &str) -> Result<Bytes> {
        let uri = self.operation_url("get", index_key)?;
        self.dispatch(Method::GET, uri, Bytes::new()).await
    }

    /// Store a value under an index key
    ///
    /// Issues a single POST to
    /// `{endpoint}store/{api_key}/{app_key}/{index_key}` with `payload` as
    /// the body, untransformed. No content-type is set; the payload shape is
    /// between the caller and the service. Returns the service's response
    /// body.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use nls_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), nls_client::Error> {
    /// # let client = Client::new("api-key", "app-key")?;
    /// client.save("user-preferences", r#"{"theme":"dark"}"#).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn save(&self, index_key: &str, payload: impl Into<Bytes>) -> Result<Bytes> {
        let uri = self.operation_url("store", index_key)?;
        self.dispatch(Method::POST, uri, payload.into()).await
    }

    /// Retrieve a value and deserialize it from JSON (convenience method)
    ///
    /// # Example
    /// ```rust,no_run
    /// # use nls_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), nls_client::Error> {
    /// # let client = Client::new("api-key", "app-key")?;
    /// let prefs: serde_json::Value = client.load_json("user-preferences").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_json<T: DeserializeOwned>(&self, index_key: &str) -> Result<T> {
        let body = self.load(index_key).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Serialize a value to JSON and store it (convenience method)
    pub async fn save_json<T: Serialize>(&self, index_key: &str, payload: &T) -> Result<Bytes> {
        let body = serde_json::to_vec(payload)?;
        self.save(index_key, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_client() -> Client {
        Client::with_config(ClientConfig {
            api_key: "a1".to_string(),
            app_key: "b1".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    // ===== ClientConfig tests =====

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_ms, 30000);
        assert!(config.api_key.is_empty());
        assert!(config.app_key.is_empty());
    }

    #[test]
    fn test_resolve_explicit_credentials() {
        let config = ClientConfig::resolve(Some("k1"), Some("k2")).unwrap();
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.app_key, "k2");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    #[serial]
    fn test_resolve_falls_back_to_environment() {
        env::set_var(API_KEY_VAR, "env-api");
        env::set_var(APP_KEY_VAR, "env-app");

        let config = ClientConfig::resolve(None, None).unwrap();
        assert_eq!(config.api_key, "env-api");
        assert_eq!(config.app_key, "env-app");

        env::remove_var(API_KEY_VAR);
        env::remove_var(APP_KEY_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_mixes_explicit_and_environment() {
        env::remove_var(API_KEY_VAR);
        env::set_var(APP_KEY_VAR, "env-app");

        let config = ClientConfig::resolve(Some("explicit-api"), None).unwrap();
        assert_eq!(config.api_key, "explicit-api");
        assert_eq!(config.app_key, "env-app");

        env::remove_var(APP_KEY_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_fails_fast_when_credentials_absent() {
        env::remove_var(API_KEY_VAR);
        env::remove_var(APP_KEY_VAR);

        let result = ClientConfig::resolve(None, None);
        match result.unwrap_err() {
            Error::MissingCredential(var) => assert_eq!(var, API_KEY_VAR),
            e => panic!("Expected MissingCredential error, got: {:?}", e),
        }
    }

    #[test]
    #[serial]
    fn test_resolve_rejects_empty_environment_value() {
        env::set_var(API_KEY_VAR, "");
        env::set_var(APP_KEY_VAR, "env-app");

        let result = ClientConfig::resolve(None, None);
        match result.unwrap_err() {
            Error::MissingCredential(var) => assert_eq!(var, API_KEY_VAR),
            e => panic!("Expected MissingCredential error, got: {:?}", e),
        }

        env::remove_var(API_KEY_VAR);
        env::remove_var(APP_KEY_VAR);
    }

    // ===== Client construction tests =====

    #[test]
    fn test_client_new() {
        let client = Client::new("a1", "b1").unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(client.api_key(), "a1");
        assert_eq!(client.app_key(), "b1");
    }

    #[test]
    fn test_client_rejects_empty_api_key() {
        let result = Client::new("", "b1");
        match result.unwrap_err() {
            Error::MissingCredential(var) => assert_eq!(var, API_KEY_VAR),
            e => panic!("Expected MissingCredential error, got: {:?}", e),
        }
    }

    #[test]
    fn test_client_rejects_empty_app_key() {
        let result = Client::new("a1", "");
        match result.unwrap_err() {
            Error::MissingCredential(var) => assert_eq!(var, APP_KEY_VAR),
            e => panic!("Expected MissingCredential error, got: {:?}", e),
        }
    }

    #[test]
    fn test_client_invalid_endpoint_url() {
        let config = ClientConfig {
            endpoint: "not a url".to_string(),
            api_key: "a1".to_string(),
            app_key: "b1".to_string(),
            ..Default::default()
        };
        let result = Client::with_config(config);
        match result.unwrap_err() {
            Error::InvalidUrl(_) => {}
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    #[test]
    fn test_client_rejects_endpoint_without_trailing_slash() {
        let config = ClientConfig {
            endpoint: "http://localhost:3000/api/data".to_string(),
            api_key: "a1".to_string(),
            app_key: "b1".to_string(),
            ..Default::default()
        };
        let result = Client::with_config(config);
        match result.unwrap_err() {
            Error::InvalidUrl(msg) => assert!(msg.contains("slash"), "Error message: {}", msg),
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }

    // ===== URL construction tests =====

    #[test]
    fn test_load_url_matches_template() {
        let client = test_client();
        let uri = client.operation_url("get", "user-1").unwrap();
        assert_eq!(
            uri.to_string(),
            "https://stg001.notlocalstorage.io/api/data/get/a1/b1/user-1"
        );
    }

    #[test]
    fn test_save_url_matches_template() {
        let client = test_client();
        let uri = client.operation_url("store", "user-1").unwrap();
        assert_eq!(
            uri.to_string(),
            "https://stg001.notlocalstorage.io/api/data/store/a1/b1/user-1"
        );
    }

    #[test]
    fn test_key_passes_through_verbatim() {
        // No escaping: the key lands in the path exactly as given
        let client = test_client();
        let uri = client.operation_url("get", "path/to/key.v2").unwrap();
        assert!(uri.to_string().ends_with("/get/a1/b1/path/to/key.v2"));
    }

    #[test]
    fn test_empty_key_rejected_before_dispatch() {
        let client = test_client();
        match client.operation_url("get", "").unwrap_err() {
            Error::EmptyKey => {}
            e => panic!("Expected EmptyKey error, got: {:?}", e),
        }
    }

    #[test]
    fn test_custom_endpoint_prefix() {
        let client = Client::with_config(ClientConfig {
            endpoint: "http://localhost:3000/api/data/".to_string(),
            api_key: "a1".to_string(),
            app_key: "b1".to_string(),
            ..Default::default()
        })
        .unwrap();
        let uri = client.operation_url("store", "x").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:3000/api/data/store/a1/b1/x");
    }
}
