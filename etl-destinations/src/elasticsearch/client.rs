use std::time::Duration;

use etl::error::{ErrorKind, EtlError, EtlResult};
use etl::{bail, etl_error};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::elasticsearch::bulk::BulkResponse;

/// Content type required by the `_bulk` endpoint.
const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Error type returned when an index is created concurrently by another client.
const INDEX_ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Maps a transport error to the matching [`ErrorKind`].
fn map_reqwest_error(err: reqwest::Error, description: &'static str) -> EtlError {
    let kind = if err.is_connect() || err.is_timeout() {
        ErrorKind::DestinationConnectionFailed
    } else if err.is_decode() {
        ErrorKind::DeserializationError
    } else {
        ErrorKind::DestinationIoError
    };

    etl_error!(kind, description, err.to_string(), source: err)
}

/// HTTP client for the Elasticsearch REST API.
///
/// Cheaply cloneable, the underlying connection pool is shared between clones.
#[derive(Clone)]
pub struct ElasticsearchClient {
    http: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<SecretString>,
}

impl std::fmt::Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish()
    }
}

impl ElasticsearchClient {
    /// Creates a client for the cluster at `url`.
    ///
    /// Basic authentication is used when a username is given. `timeout` bounds every request,
    /// from connecting to reading the whole response.
    pub fn new(
        url: &str,
        username: Option<String>,
        password: Option<SecretString>,
        timeout: Duration,
    ) -> EtlResult<Self> {
        let base_url = Url::parse(url).map_err(|err| {
            etl_error!(
                ErrorKind::ConfigError,
                "Invalid Elasticsearch url",
                format!("'{url}' is not a valid url: {err}"),
                source: err
            )
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                ErrorKind::ConfigError,
                "Invalid Elasticsearch url",
                format!("'{url}' must use the http or https scheme")
            );
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Failed to build Elasticsearch http client",
                    err.to_string(),
                    source: err
                )
            })?;

        Ok(Self {
            http,
            base_url,
            username,
            password,
        })
    }

    /// Returns the url of `segments` below the base url.
    fn endpoint(&self, segments: &[&str]) -> EtlResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Invalid Elasticsearch url",
                    format!("'{}' cannot be used as a base url", self.base_url)
                )
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);

        match &self.username {
            Some(username) => request.basic_auth(
                username,
                self.password.as_ref().map(|password| password.expose_secret()),
            ),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, description: &'static str) -> EtlResult<Response> {
        request
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, description))
    }

    /// Returns `true` if `index` exists.
    pub async fn index_exists(&self, index: &str) -> EtlResult<bool> {
        let url = self.endpoint(&[index])?;
        let response = self
            .send(
                self.request(Method::HEAD, url),
                "Elasticsearch index lookup failed",
            )
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(etl_error!(
                ErrorKind::DestinationProvisioningFailed,
                "Elasticsearch index lookup failed",
                format!("Checking index '{index}' returned HTTP {status}")
            )),
        }
    }

    /// Creates `index` with the cluster defaults.
    ///
    /// Succeeds when the index was created concurrently by another client.
    pub async fn create_index(&self, index: &str) -> EtlResult<()> {
        let url = self.endpoint(&[index])?;
        let response = self
            .send(
                self.request(Method::PUT, url),
                "Elasticsearch index creation failed",
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(index, "elasticsearch index created");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains(INDEX_ALREADY_EXISTS) {
            debug!(index, "elasticsearch index created concurrently");
            return Ok(());
        }

        Err(etl_error!(
            ErrorKind::DestinationProvisioningFailed,
            "Elasticsearch index creation failed",
            format!("Creating index '{index}' returned HTTP {status}: {body}")
        ))
    }

    /// Applies a mapping body to `index`.
    pub async fn put_mapping(&self, index: &str, mapping: &serde_json::Value) -> EtlResult<()> {
        let url = self.endpoint(&[index, "_mapping"])?;
        let response = self
            .send(
                self.request(Method::PUT, url).json(mapping),
                "Elasticsearch mapping update failed",
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                ErrorKind::DestinationProvisioningFailed,
                "Elasticsearch mapping update failed",
                format!("Updating the mapping of index '{index}' returned HTTP {status}: {body}")
            );
        }

        Ok(())
    }

    /// Sends an NDJSON body to the `_bulk` endpoint and decodes the per-item results.
    ///
    /// A non-success status means the request as a whole was refused, in which case no item
    /// results are available.
    pub async fn bulk(&self, body: String) -> EtlResult<BulkResponse> {
        let url = self.endpoint(&["_bulk"])?;
        let request = self
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(body);
        let response = self.send(request, "Elasticsearch bulk request failed").await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                ErrorKind::DestinationError,
                "Elasticsearch bulk request failed",
                format!("Bulk request returned HTTP {status}: {body}")
            );
        }

        response
            .json::<BulkResponse>()
            .await
            .map_err(|err| map_reqwest_error(err, "Elasticsearch bulk response is invalid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> EtlResult<ElasticsearchClient> {
        ElasticsearchClient::new(url, None, None, Duration::from_secs(1))
    }

    #[test]
    fn endpoints_are_appended_to_the_base_path() {
        let client = client("http://localhost:9200/").unwrap();
        assert_eq!(
            client.endpoint(&["orders", "_mapping"]).unwrap().as_str(),
            "http://localhost:9200/orders/_mapping"
        );

        let client = self::client("https://search.internal/es").unwrap();
        assert_eq!(
            client.endpoint(&["_bulk"]).unwrap().as_str(),
            "https://search.internal/es/_bulk"
        );
    }

    #[test]
    fn index_names_are_percent_encoded() {
        let client = client("http://localhost:9200").unwrap();
        assert_eq!(
            client.endpoint(&["a/b"]).unwrap().as_str(),
            "http://localhost:9200/a%2Fb"
        );
    }

    #[test]
    fn invalid_urls_are_config_errors() {
        assert_eq!(
            client("not a url").unwrap_err().kind(),
            ErrorKind::ConfigError
        );
        assert_eq!(
            client("ftp://localhost").unwrap_err().kind(),
            ErrorKind::ConfigError
        );
    }
}
