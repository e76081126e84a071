use crate::state::AppContext;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use tracing::info;

/// Replay the offline queue whenever the browser reports it is back online.
///
/// The returned handle must be kept alive for the lifetime of the app.
pub(crate) fn start_online_listener(app_state: AppContext) -> WindowListenerHandle {
    window_event_listener(ev::online, move |_ev: web_sys::Event| {
        info!("network back online; replaying offline queue");
        sync_now(app_state.clone());
    })
}

/// Run one replay pass and refresh the pending counter.
pub(crate) fn sync_now(app_state: AppContext) {
    spawn_local(async move {
        let state = &app_state.0;
        let report = state.offline_queue.process_queue(&state.api_client).await;
        if !report.skipped {
            info!(
                attempted = report.attempted,
                synced = report.synced,
                retained = report.retained,
                dropped = report.dropped,
                "offline queue replay finished"
            );
        }
        state.refresh_pending_count();
    });
}
