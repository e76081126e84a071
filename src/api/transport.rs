use super::{ApiError, ApiResult};
use reqwest::Method;

/// One multipart field carrying a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<FilePart>),
}

/// Transport-level request. Rebuildable, so a call can be re-issued after a
/// token refresh.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn post_json(path: &str, body: &impl serde::Serialize) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(ApiError::parse)?;
        Ok(Self {
            method: Method::POST,
            path: path.to_string(),
            body: RequestBody::Json(value),
            bearer: None,
        })
    }

    pub fn post_multipart(path: &str, parts: Vec<FilePart>) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            body: RequestBody::Multipart(parts),
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 2xx passes, 401 becomes `Unauthorized`, anything else `Http`.
    pub fn into_result(self, ctx: &str) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else if self.status == 401 {
            Err(ApiError::unauthorized())
        } else {
            Err(ApiError::http(self.status, self.body, ctx))
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body).map_err(ApiError::parse)
    }
}

/// Sends one request and reports the raw status. Only connectivity problems
/// are errors at this layer.
pub(crate) trait Transport: Clone {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

#[derive(Clone, Debug)]
pub(crate) struct ReqwestTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    fn multipart_form(parts: &[FilePart]) -> ApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for p in parts {
            let part = reqwest::multipart::Part::bytes(p.bytes.clone())
                .file_name(p.file_name.clone())
                .mime_str(&p.mime)
                .map_err(ApiError::network)?;
            form = form.part(p.field.clone(), part);
        }
        Ok(form)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = self.client.request(request.method.clone(), url);
        req = Self::with_auth_headers(req, request.bearer.as_deref());

        req = match &request.body {
            RequestBody::Json(v) => req.json(v),
            RequestBody::Multipart(parts) => req.multipart(Self::multipart_form(parts)?),
        };

        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status().as_u16();
        let body = res.text().await.map_err(ApiError::network)?;

        Ok(ApiResponse { status, body })
    }
}
