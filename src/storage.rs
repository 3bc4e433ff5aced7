//! Object storage operations
//!
//! Only what the admin document-upload flow needs: push a file, get back a
//! retrievable public link. Bucket management stays on the provider side.

use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::error::Error;

/// Client for the hosted object storage service
pub struct StorageClient {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// Access token of the signed-in user, when any
    auth_token: Option<String>,

    /// HTTP client used for requests
    client: Client,
}

/// Response body from an object upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedObject {
    /// Storage key of the uploaded object, `bucket/path`
    #[serde(rename = "Key")]
    pub key: String,
}

impl StorageClient {
    /// Create a new StorageClient
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            auth_token: None,
            client,
        }
    }

    /// Attach the signed-in user's access token to subsequent requests
    pub fn with_auth(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Upload a document to a bucket and return its public URL
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let url = self.get_url(&format!("/object/{}/{}", bucket, path));

        let part = multipart::Part::bytes(bytes)
            .file_name(path.to_string())
            .mime_str(content_type)
            .map_err(|e| Error::storage(format!("Invalid content type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let mut req = self
            .client
            .post(&url)
            .header("apikey", &self.key)
            .multipart(form);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            log::warn!("upload of {}/{} failed: {} {}", bucket, path, status, text);
            return Err(Error::storage(format!(
                "Upload failed with status {}: {}",
                status, text
            )));
        }

        // The response's Key confirms the object location; the public URL is
        // derived from it so callers get a link they can render immediately.
        let uploaded = response.json::<UploadedObject>().await?;
        log::debug!("uploaded object {}", uploaded.key);
        Ok(self.public_url(bucket, path))
    }

    /// Public URL for an object in a public bucket
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, bucket, path)
    }
}
