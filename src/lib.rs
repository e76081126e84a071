mod api;
mod app;
mod components;
mod compose;
mod config;
mod logging;
mod models;
mod offline;
mod pages;
mod routes;
mod session;
mod state;
mod storage;
mod util;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod testing;

use crate::app::App;
use crate::config::EnvConfig;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(&EnvConfig::new().log_level);
    mount_to_body(App);
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::models::MemoDraft;
    use crate::offline::OfflineQueue;
    use crate::session::Session;
    use crate::storage::LocalStorage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_local_storage_roundtrip() {
        let session = Session::restore(LocalStorage);
        session.clear_tokens().unwrap();
        assert!(!session.is_authenticated());

        session.set_tokens("t1", "r1").unwrap();

        let restored = Session::restore(LocalStorage);
        assert_eq!(restored.access_token().as_deref(), Some("t1"));
        assert_eq!(restored.refresh_token().as_deref(), Some("r1"));

        restored.clear_tokens().unwrap();
        assert!(!Session::restore(LocalStorage).is_authenticated());
    }

    #[wasm_bindgen_test]
    fn test_offline_queue_local_storage_roundtrip() {
        let queue = OfflineQueue::new(LocalStorage);
        queue.clear().unwrap();

        queue
            .add(MemoDraft {
                content: "queued in the browser".to_string(),
                ..Default::default()
            })
            .unwrap();

        let q = OfflineQueue::new(LocalStorage).get_queue().unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].content, "queued in the browser");
        assert_eq!(q[0].retry_count, 0);

        queue.clear().unwrap();
    }
}
