//! Test doubles shared by the unit tests.

use crate::api::{ApiRequest, ApiResponse, ApiResult, Transport};
use std::sync::{Arc, Mutex};

type Handler = Arc<dyn Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync>;

#[derive(Default)]
struct MockState {
    handler: Option<Handler>,
    requests: Vec<ApiRequest>,
}

/// Records every request and answers through a configurable handler.
/// Each `send` yields once before answering so concurrent callers interleave.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        &self,
        handler: impl Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync + 'static,
    ) {
        self.state.lock().unwrap().handler = Some(Arc::new(handler));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        tokio::task::yield_now().await;

        let handler = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.handler.clone()
        };
        match handler {
            Some(h) => h(request),
            None => Ok(json_response(404, "no handler")),
        }
    }
}

pub(crate) fn json_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}
