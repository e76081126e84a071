use crate::api::{ApiClient, ApiError, ApiResult, Transport};
use crate::models::MemoDraft;
use crate::offline::OfflineQueue;
use crate::storage::KeyValueStore;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    Created,
    /// Saved locally; it will be sent when the network comes back.
    Queued,
}

/// Send a memo now, or park it in the offline queue when the network is
/// unavailable. Server-side rejections are returned, not queued.
pub(crate) async fn submit_memo<T, A, Q>(
    client: &ApiClient<T, A>,
    queue: &OfflineQueue<Q>,
    draft: MemoDraft,
    online: bool,
) -> ApiResult<SubmitOutcome>
where
    T: Transport,
    A: KeyValueStore,
    Q: KeyValueStore,
{
    if draft.content.trim().is_empty() {
        return Err(ApiError::validation("Memo content is required"));
    }

    if !online {
        queue.add(draft)?;
        return Ok(SubmitOutcome::Queued);
    }

    let source = draft.source.unwrap_or_default();
    match client.publish_memo(&draft.content, &draft.images, source).await {
        Ok(()) => {
            info!("memo created");
            Ok(SubmitOutcome::Created)
        }
        Err(e) if e.is_network() => {
            warn!(error = %e, "memo could not reach the server; queueing");
            queue.add(draft)?;
            Ok(SubmitOutcome::Queued)
        }
        Err(e) => Err(e),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::api::{ApiErrorKind, MEMOS_PATH};
    use crate::models::MemoSource;
    use crate::session::Session;
    use crate::storage::MemoryStorage;
    use crate::testing::{json_response, MockTransport};

    fn setup() -> (
        MockTransport,
        ApiClient<MockTransport, MemoryStorage>,
        OfflineQueue<MemoryStorage>,
    ) {
        let transport = MockTransport::new();
        let session = Session::restore(MemoryStorage::new());
        session.set_tokens("acc", "ref").unwrap();
        let client = ApiClient::new(transport.clone(), session, || {});
        (transport, client, OfflineQueue::new(MemoryStorage::new()))
    }

    fn draft(content: &str) -> MemoDraft {
        MemoDraft {
            content: content.to_string(),
            images: vec![],
            source: Some(MemoSource::Web),
        }
    }

    #[tokio::test]
    async fn test_online_success_creates_without_queueing() {
        let (transport, client, queue) = setup();
        transport.respond(|_| Ok(json_response(201, "{}")));

        let out = submit_memo(&client, &queue, draft("hello"), true).await.unwrap();

        assert_eq!(out, SubmitOutcome::Created);
        assert!(queue.get_queue().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_queues_without_network() {
        let (transport, client, queue) = setup();

        let out = submit_memo(&client, &queue, draft("later"), false).await.unwrap();

        assert_eq!(out, SubmitOutcome::Queued);
        assert!(transport.requests().is_empty());
        let q = queue.get_queue().unwrap();
        assert_eq!(q[0].content, "later");
        assert_eq!(q[0].source, MemoSource::Web);
    }

    #[tokio::test]
    async fn test_network_error_falls_back_to_queue() {
        let (transport, client, queue) = setup();
        transport.respond(|_| Err(ApiError::network("dns failure")));

        let out = submit_memo(&client, &queue, draft("flaky"), true).await.unwrap();

        assert_eq!(out, SubmitOutcome::Queued);
        assert_eq!(transport.count_path(MEMOS_PATH), 1);
        assert_eq!(queue.get_queue().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_rejection_is_not_queued() {
        let (transport, client, queue) = setup();
        transport.respond(|_| Ok(json_response(400, "too long")));

        let err = submit_memo(&client, &queue, draft("x"), true).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::Http);
        assert!(queue.get_queue().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_up_front() {
        let (transport, client, queue) = setup();

        let err = submit_memo(&client, &queue, draft("   "), false).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert!(transport.requests().is_empty());
        assert!(queue.get_queue().unwrap().is_empty());
    }
}
