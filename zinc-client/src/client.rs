//! Thin typed wrapper over one `reqwest::Client` plus a base catalog `Url`,
//! for read-only mirror access.

use bytes::Bytes;
use reqwest::Client as HttpClient;
use tracing::debug;
use url::Url;
use zinc_core::{Format, Index, Manifest, pathmap};

use crate::error::{Error, Result};

/// The only `x-zinc-api-version` value this client understands.
pub const SUPPORTED_API_VERSION: &str = "1.0";

/// Read-only consumer of a Zinc catalog mirror served over HTTP(S).
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    base_url: Url,
}

impl Client {
    /// Perform the `HEAD` + `x-zinc-api-version` handshake before returning
    /// a usable client. A missing header or any value other than
    /// [`SUPPORTED_API_VERSION`] is a hard refusal.
    pub async fn connect(base_url: Url) -> Result<Self> {
        Self::connect_with(HttpClient::new(), base_url).await
    }

    pub async fn connect_with(http: HttpClient, mut base_url: Url) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let response = http.head(base_url.clone()).send().await?;
        let version = response
            .headers()
            .get("x-zinc-api-version")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if version.as_deref() != Some(SUPPORTED_API_VERSION) {
            return Err(Error::UnsupportedApiVersion(version));
        }

        debug!(base_url = %base_url, "connected to zinc catalog mirror");
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn subpath_url(&self, subpath: &str) -> Result<Url> {
        self.base_url.join(subpath).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    async fn get_bytes(&self, subpath: &str) -> Result<Bytes> {
        let url = self.subpath_url(subpath)?;
        let response = self.http.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(subpath.to_string()));
        }
        Ok(response.error_for_status()?.bytes().await?)
    }

    pub async fn index(&self) -> Result<Index> {
        let bytes = self.get_bytes(pathmap::INDEX_PATH).await?;
        Ok(Index::deserialize(&bytes)?)
    }

    pub async fn bundle_names(&self) -> Result<Vec<String>> {
        Ok(self.index().await?.bundle_names())
    }

    pub async fn versions_for_bundle(&self, bundle_name: &str) -> Result<Vec<u32>> {
        Ok(self.index().await?.versions_for_bundle(bundle_name))
    }

    pub async fn distribution(&self, bundle_name: &str, distro: &str) -> Result<Option<u32>> {
        Ok(self.index().await?.distribution(bundle_name, distro))
    }

    pub async fn manifest(&self, bundle_name: &str, version: u32) -> Result<Manifest> {
        let bytes = self.get_bytes(&pathmap::manifest_path(bundle_name, version)).await?;
        Ok(Manifest::deserialize(&bytes)?)
    }

    pub async fn object(&self, sha: &str, format: Format) -> Result<Bytes> {
        self.get_bytes(&pathmap::object_path(sha, format)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn connect_accepts_supported_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-zinc-api-version", "1.0"))
            .mount(&server)
            .await;

        let client = Client::connect(Url::parse(&server.uri()).unwrap()).await.unwrap();
        assert_eq!(client.base_url().as_str(), format!("{}/", server.uri()));
    }

    #[tokio::test]
    async fn connect_refuses_missing_header() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD")).and(path("/")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let err = Client::connect(Url::parse(&server.uri()).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedApiVersion(None)));
    }

    #[tokio::test]
    async fn connect_refuses_unsupported_version() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-zinc-api-version", "2.0"))
            .mount(&server)
            .await;

        let err = Client::connect(Url::parse(&server.uri()).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedApiVersion(Some(v)) if v == "2.0"));
    }

    #[tokio::test]
    async fn fetches_index_and_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-zinc-api-version", "1.0"))
            .mount(&server)
            .await;

        let index = Index::new("com.example.test");
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(index.serialize().unwrap()))
            .mount(&server)
            .await;

        let manifest = Manifest::create("com.example.test", "meep", 1);
        Mock::given(method("GET"))
            .and(path("/manifests/meep/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(manifest.serialize().unwrap()))
            .mount(&server)
            .await;

        let client = Client::connect(Url::parse(&server.uri()).unwrap()).await.unwrap();
        assert_eq!(client.index().await.unwrap(), index);
        assert_eq!(client.manifest("meep", 1).await.unwrap(), manifest);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-zinc-api-version", "1.0"))
            .mount(&server)
            .await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let client = Client::connect(Url::parse(&server.uri()).unwrap()).await.unwrap();
        let err = client.object("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", Format::Raw).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
