//! DIAL file API object store.
//!
//! Snapshots are plain files in the caller's DIAL appdata:
//!
//! - `GET    {endpoint}/v1/bucket`  resolves the key's bucket and appdata home
//! - `GET    {endpoint}/v1/{path}`  downloads a file
//! - `PUT    {endpoint}/v1/{path}`  uploads a file (multipart, field `file`)
//! - `DELETE {endpoint}/v1/{path}`  deletes a file
//!
//! Every request carries the `Api-Key` header. The key is held as a
//! [`SecretString`] and is only exposed when building request headers.

use std::time::Duration;

use longmem_core::storage::object_store::ObjectStore;
use longmem_types::error::StorageError;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const API_KEY_HEADER: &str = "Api-Key";

#[derive(Debug, Deserialize)]
struct BucketInfo {
    appdata: Option<String>,
}

/// Object store over a DIAL deployment's file API.
///
/// Does not derive Debug so the API key cannot leak through formatting.
pub struct DialObjectStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl DialObjectStore {
    pub fn new(endpoint: &str, api_key: SecretString, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// The appdata home of the application owning this API key.
    ///
    /// Memory snapshots for the key's user live under `files/{appdata}/`.
    pub async fn appdata_home(&self) -> Result<String, StorageError> {
        let response = self
            .client
            .get(self.url("bucket"))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status("bucket", response).await?;

        let info: BucketInfo = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("invalid bucket response: {e}")))?;
        info.appdata.ok_or_else(|| {
            StorageError::Backend("API key has no appdata home; is it an application key?".to_string())
        })
    }
}

fn transport_error(err: reqwest::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Turn non-success responses into errors; 404 becomes `NotFound`.
async fn check_status(
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound(path.to_string()));
    }
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect();
    Err(StorageError::Backend(format!("{status} for {path}: {body}")))
}

impl ObjectStore for DialObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get(self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(path, response).await?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        tracing::debug!(path, bytes = bytes.len(), "downloaded from DIAL");
        Ok(bytes.to_vec())
    }

    async fn upload(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let part = Part::bytes(data.to_vec())
            .file_name(file_name)
            .mime_str("application/json")
            .map_err(transport_error)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .put(self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(path, response).await?;

        tracing::debug!(path, bytes = data.len(), "uploaded to DIAL");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        check_status(path, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Multipart, Path, State};
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::routing::get;

    const TEST_KEY: &str = "test-app-key";
    const APPDATA: &str = "bucket-123/appdata/memory-agent";

    type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == TEST_KEY)
    }

    async fn bucket(headers: HeaderMap) -> Result<String, HttpStatus> {
        if !authorized(&headers) {
            return Err(HttpStatus::UNAUTHORIZED);
        }
        Ok(format!(r#"{{"bucket":"bucket-123","appdata":"{APPDATA}"}}"#))
    }

    async fn get_file(
        State(files): State<Files>,
        Path(rest): Path<String>,
        headers: HeaderMap,
    ) -> Result<Bytes, HttpStatus> {
        if !authorized(&headers) {
            return Err(HttpStatus::UNAUTHORIZED);
        }
        let key = format!("files/{rest}");
        files
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .map(Bytes::from)
            .ok_or(HttpStatus::NOT_FOUND)
    }

    async fn put_file(
        State(files): State<Files>,
        Path(rest): Path<String>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> HttpStatus {
        if !authorized(&headers) {
            return HttpStatus::UNAUTHORIZED;
        }
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("file") {
                let Ok(bytes) = field.bytes().await else {
                    return HttpStatus::BAD_REQUEST;
                };
                files
                    .lock()
                    .unwrap()
                    .insert(format!("files/{rest}"), bytes.to_vec());
                return HttpStatus::OK;
            }
        }
        HttpStatus::BAD_REQUEST
    }

    async fn delete_file(
        State(files): State<Files>,
        Path(rest): Path<String>,
        headers: HeaderMap,
    ) -> HttpStatus {
        if !authorized(&headers) {
            return HttpStatus::UNAUTHORIZED;
        }
        match files.lock().unwrap().remove(&format!("files/{rest}")) {
            Some(_) => HttpStatus::OK,
            None => HttpStatus::NOT_FOUND,
        }
    }

    /// Start a fake DIAL file API on an ephemeral port.
    async fn spawn_server() -> (String, Files) {
        let files: Files = Arc::default();
        let app = Router::new()
            .route("/v1/bucket", get(bucket))
            .route(
                "/v1/files/{*rest}",
                get(get_file).put(put_file).delete(delete_file),
            )
            .with_state(files.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), files)
    }

    fn store(endpoint: &str, key: &str) -> DialObjectStore {
        DialObjectStore::new(
            endpoint,
            SecretString::from(key.to_string()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_appdata_home() {
        let (endpoint, _) = spawn_server().await;
        let store = store(&endpoint, TEST_KEY);
        assert_eq!(store.appdata_home().await.unwrap(), APPDATA);
    }

    #[tokio::test]
    async fn test_upload_download_delete_roundtrip() {
        let (endpoint, files) = spawn_server().await;
        let store = store(&format!("{endpoint}/"), TEST_KEY);
        let path = format!("files/{APPDATA}/__long-memories/data.json");

        store.upload(&path, br#"{"memories":[]}"#).await.unwrap();
        assert!(files.lock().unwrap().contains_key(&path));
        assert_eq!(store.download(&path).await.unwrap(), br#"{"memories":[]}"#);

        store.delete(&path).await.unwrap();
        assert!(matches!(
            store.download(&path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (endpoint, _) = spawn_server().await;
        let store = store(&endpoint, TEST_KEY);
        assert!(matches!(
            store.delete("files/nobody/data.json").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_key_is_backend_error() {
        let (endpoint, _) = spawn_server().await;
        let store = store(&endpoint, "wrong-key");

        let err = store.download("files/x/data.json").await.unwrap_err();
        match err {
            StorageError::Backend(msg) => assert!(msg.contains("401")),
            other => panic!("expected backend error, got {other:?}"),
        }
        assert!(store.appdata_home().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_backend_error() {
        let store = store("http://127.0.0.1:1", TEST_KEY);
        assert!(matches!(
            store.download("files/x/data.json").await,
            Err(StorageError::Backend(_))
        ));
    }
}
