use serde::{Deserialize, Serialize};

/// Credential pair issued by `/auth/login`, `/auth/register` and `/auth/refresh`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

/// Where a memo was written from.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum MemoSource {
    #[default]
    Mobile,
    Web,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateMemoRequest {
    pub content: String,
    /// URLs returned by the upload endpoint, in upload order.
    pub images: Vec<String>,
    pub source: MemoSource,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UploadedFile {
    pub url: String,
}

/// `/api/v1/upload` reply. `success` has been seen as both `1` and `true`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub success: serde_json::Value,
    #[serde(default)]
    pub file: Option<UploadedFile>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.success.as_bool().unwrap_or(false) || self.success.as_i64() == Some(1)
    }

    /// The stored file URL, only when the upload reported success.
    pub fn into_url(self) -> Option<String> {
        if !self.is_success() {
            return None;
        }
        self.file.map(|f| f.url).filter(|u| !u.trim().is_empty())
    }
}

/// A binary attachment waiting to be uploaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct QueuedImage {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A memo as typed by the user, before it is sent or queued.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MemoDraft {
    pub content: String,
    pub images: Vec<QueuedImage>,
    pub source: Option<MemoSource>,
}
