mod transport;

pub(crate) use transport::{ApiRequest, ApiResponse, FilePart, ReqwestTransport, Transport};
#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) use transport::RequestBody;

use crate::models::{
    CreateMemoRequest, CredentialsRequest, MemoSource, QueuedImage, RefreshRequest, TokenPair,
    UploadResponse,
};
use crate::session::Session;
use crate::storage::{KeyValueStore, StorageError};
use futures::lock::Mutex as AsyncMutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";
pub(crate) const UPLOAD_PATH: &str = "/api/v1/upload";
pub(crate) const MEMOS_PATH: &str = "/api/v1/memos";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    Upload,
    Validation,
    Storage,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn network(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn http(status: u16, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn upload_rejected(file_name: &str) -> Self {
        Self {
            kind: ApiErrorKind::Upload,
            message: format!("upload of {file_name} was not accepted"),
        }
    }

    pub(crate) fn validation(message: &str) -> Self {
        Self {
            kind: ApiErrorKind::Validation,
            message: message.to_string(),
        }
    }

    pub(crate) fn is_network(&self) -> bool {
        self.kind == ApiErrorKind::Network
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self {
            kind: ApiErrorKind::Storage,
            message: e.to_string(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Where a single outbound call is in the 401 recovery protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum CallState {
    #[default]
    Sent,
    Refreshing,
    Retried,
    Done,
    LoggedOut,
}

/// Per-call bookkeeping. `retried` flips at most once per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CallContext {
    pub retried: bool,
    pub state: CallState,
}

impl CallContext {
    fn advance(&mut self, next: CallState) {
        debug!(from = ?self.state, to = ?next, "call state");
        self.state = next;
    }
}

type SessionExpiredHandler = Arc<dyn Fn() + Send + Sync>;

/// Hard navigation to the login view.
pub(crate) fn redirect_to_login() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href("/login");
    }
}

#[derive(Clone)]
pub(crate) struct ApiClient<T, S> {
    transport: T,
    session: Session<S>,
    on_session_expired: SessionExpiredHandler,
    /// Held for the whole refresh exchange so concurrent 401s share one.
    refresh_gate: Arc<AsyncMutex<()>>,
}

impl<T: Transport, S: KeyValueStore> ApiClient<T, S> {
    pub fn new(
        transport: T,
        session: Session<S>,
        on_session_expired: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            transport,
            session,
            on_session_expired: Arc::new(on_session_expired),
            refresh_gate: Arc::new(AsyncMutex::new(())),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Outbound interceptor: attach the current access token, if any.
    fn authorize(&self, request: &ApiRequest) -> ApiRequest {
        request.clone().with_bearer(self.session.access_token())
    }

    pub async fn execute(&self, request: &ApiRequest, ctx: &str) -> ApiResult<ApiResponse> {
        let mut call = CallContext::default();
        self.dispatch(request, &mut call)
            .await?
            .into_result(ctx)
    }

    /// Sends `request` and runs the 401 recovery protocol. Returns the final
    /// response regardless of status; only refresh and transport failures are
    /// errors here.
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
        call: &mut CallContext,
    ) -> ApiResult<ApiResponse> {
        let authorized = self.authorize(request);
        let response = self.transport.send(&authorized).await?;

        if response.status != 401 || call.retried {
            call.advance(CallState::Done);
            return Ok(response);
        }
        call.retried = true;

        let access_token = {
            let _gate = self.refresh_gate.lock().await;

            match self.session.access_token() {
                // Renewed by a concurrent call while this one waited.
                Some(current) if authorized.bearer.as_deref() != Some(current.as_str()) => {
                    debug!(path = %request.path, "reusing token refreshed by another call");
                    current
                }
                _ => {
                    let Some(refresh_token) = self.session.refresh_token() else {
                        call.advance(CallState::Done);
                        return Ok(response);
                    };

                    call.advance(CallState::Refreshing);
                    let pair = match self.exchange_refresh_token(&refresh_token).await {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, path = %request.path, "token refresh failed; ending session");
                            call.advance(CallState::LoggedOut);
                            self.expire_session();
                            return Err(e);
                        }
                    };

                    if let Err(e) = self.session.set_tokens(&pair.access_token, &pair.refresh_token) {
                        warn!(error = %e, "refreshed tokens could not be persisted");
                    }
                    info!(path = %request.path, "access token refreshed; retrying request");
                    pair.access_token
                }
            }
        };

        call.advance(CallState::Retried);
        let retried = request.clone().with_bearer(Some(access_token));
        let response = self.transport.send(&retried).await?;
        call.advance(CallState::Done);
        Ok(response)
    }

    /// Talks to the transport directly so the exchange never re-enters the
    /// recovery protocol.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let req = ApiRequest::post_json(
            REFRESH_PATH,
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )?;
        self.transport
            .send(&req)
            .await?
            .into_result("Token refresh failed")?
            .json()
    }

    fn expire_session(&self) {
        if let Err(e) = self.session.clear_tokens() {
            warn!(error = %e, "could not erase tokens");
        }
        (self.on_session_expired)();
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<TokenPair> {
        let req = ApiRequest::post_json(
            LOGIN_PATH,
            &CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        let pair: TokenPair = self.execute(&req, "Login failed").await?.json()?;
        self.session
            .set_tokens(&pair.access_token, &pair.refresh_token)?;
        Ok(pair)
    }

    /// Creates the account. The caller still has to log in.
    pub async fn register(&self, email: &str, password: &str) -> ApiResult<TokenPair> {
        let req = ApiRequest::post_json(
            REGISTER_PATH,
            &CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        self.execute(&req, "Registration failed").await?.json()
    }

    pub fn logout(&self) -> ApiResult<()> {
        self.session.clear_tokens()?;
        Ok(())
    }

    pub async fn upload_image(&self, image: &QueuedImage) -> ApiResult<String> {
        let req = ApiRequest::post_multipart(
            UPLOAD_PATH,
            vec![FilePart {
                field: "image".to_string(),
                file_name: image.file_name.clone(),
                mime: image.mime.clone(),
                bytes: image.bytes.clone(),
            }],
        );
        let reply: UploadResponse = self.execute(&req, "Upload failed").await?.json()?;
        reply
            .into_url()
            .ok_or_else(|| ApiError::upload_rejected(&image.file_name))
    }

    /// Only `201 Created` counts as acknowledged.
    pub async fn create_memo(&self, body: &CreateMemoRequest) -> ApiResult<()> {
        let req = ApiRequest::post_json(MEMOS_PATH, body)?;
        let res = self.execute(&req, "Create memo failed").await?;
        if res.status == 201 {
            Ok(())
        } else {
            Err(ApiError::http(res.status, res.body, "Create memo not acknowledged"))
        }
    }

    /// Upload every image in order, then create the memo. Any failure aborts
    /// the whole publish; nothing is partially applied on our side.
    pub async fn publish_memo(
        &self,
        content: &str,
        images: &[QueuedImage],
        source: MemoSource,
    ) -> ApiResult<()> {
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            urls.push(self.upload_image(image).await?);
        }

        self.create_memo(&CreateMemoRequest {
            content: content.to_string(),
            images: urls,
            source,
        })
        .await
    }
}
