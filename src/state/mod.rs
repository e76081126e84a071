use crate::api::{redirect_to_login, ApiClient, ReqwestTransport};
use crate::config::EnvConfig;
use crate::offline::OfflineQueue;
use crate::session::Session;
use crate::storage::LocalStorage;
use leptos::prelude::*;
use tracing::{info, warn};

pub(crate) type BrowserClient = ApiClient<ReqwestTransport, LocalStorage>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub session: Session<LocalStorage>,
    pub api_client: BrowserClient,
    pub offline_queue: OfflineQueue<LocalStorage>,

    /// Bumped on every sign-in/sign-out so views re-read the session.
    pub session_epoch: RwSignal<u64>,

    /// Memos waiting in the offline queue.
    pub pending_count: RwSignal<usize>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        let session = Session::restore(LocalStorage);
        let transport = ReqwestTransport::new(config.api_url.clone());
        let api_client = ApiClient::new(transport, session.clone(), redirect_to_login);
        let offline_queue = OfflineQueue::new(LocalStorage);

        info!(api_url = %config.api_url, "app state ready");

        let s = Self {
            session,
            api_client,
            offline_queue,
            session_epoch: RwSignal::new(0),
            pending_count: RwSignal::new(0),
        };
        s.refresh_pending_count();
        s
    }

    /// Tracked read of the derived sign-in state.
    pub fn is_authenticated(&self) -> bool {
        self.session_epoch.track();
        self.session.is_authenticated()
    }

    pub fn session_changed(&self) {
        self.session_epoch.update(|n| *n += 1);
    }

    pub fn refresh_pending_count(&self) {
        match self.offline_queue.get_queue() {
            Ok(q) => self.pending_count.set(q.len()),
            Err(e) => warn!(error = %e, "could not read offline queue"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
