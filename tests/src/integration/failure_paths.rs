//! # Failure Paths
//!
//! Nothing here produces an envelope: the protocol has no error kind. Each
//! case checks that the broker stays silent for the bad request, reports the
//! outcome to its observer, and keeps serving the next request.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use service_broker::{Arguments, DispatchEvent, HandlerError, Invocation, MethodSignature};
    use shared_types::{EnvelopeKind, TypeDescriptor};

    use crate::integration::fixtures::{register_sum, Harness};

    /// Register `sum` behind a call counter.
    fn counted_sum(h: &Harness) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        h.broker.register_method(
            "sum",
            [TypeDescriptor::INT, TypeDescriptor::INT],
            move |args: Arguments| -> Result<Invocation, HandlerError> {
                counter.fetch_add(1, Ordering::SeqCst);
                crate::integration::fixtures::sum(args)
            },
            Some(TypeDescriptor::INT),
        );
        calls
    }

    /// The broker still answers a valid request.
    async fn assert_still_serving(h: &mut Harness) {
        h.request("sum", json!([20, 22]), "after");
        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": 42, "id": "after"})
        );
    }

    // =============================================================================
    // DROPPED BEFORE THE HANDLER
    // =============================================================================

    #[tokio::test]
    async fn test_unknown_method_is_silent() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        assert_eq!(h.broker.registered_methods().await, vec!["sum"]);

        h.request("product", json!([2, 3]), "u1");

        h.expect_silence().await;
        assert_eq!(
            h.next_event().await,
            DispatchEvent::UnknownMethod {
                method: "product".into(),
                id: "u1".into()
            }
        );
        assert_eq!(h.broker.registered_methods().await, vec!["sum"]);
        assert_still_serving(&mut h).await;
    }

    #[tokio::test]
    async fn test_overflowed_requests_are_reported_lost() {
        let mut h = Harness::with_capacity("calc", 4);
        register_sum(&h.broker);
        assert_eq!(h.broker.registered_methods().await, vec!["sum"]);

        // The broker task cannot run until this test yields.
        for i in 0..10 {
            h.request("sum", json!([i, 1]), &format!("r{i}"));
        }

        assert_eq!(h.next_event().await, DispatchEvent::Lost { count: 6 });

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(h.next_result().await["id"].clone());
        }
        assert_eq!(ids, vec![json!("r6"), json!("r7"), json!("r8"), json!("r9")]);
        h.expect_silence().await;
    }

    #[tokio::test]
    async fn test_too_few_arguments() {
        let mut h = Harness::new("calc");
        let calls = counted_sum(&h);

        h.request("sum", json!([2]), "a1");

        h.expect_silence().await;
        assert_eq!(
            h.next_event().await,
            DispatchEvent::ArityMismatch {
                method: "sum".into(),
                id: "a1".into(),
                expected: 2,
                received: 1
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_still_serving(&mut h).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_too_many_arguments() {
        let mut h = Harness::new("calc");
        let calls = counted_sum(&h);

        h.request("sum", json!([1, 2, 3]), "a2");

        h.expect_silence().await;
        assert!(matches!(
            h.next_event().await,
            DispatchEvent::ArityMismatch {
                expected: 2,
                received: 3,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_argument_of_wrong_type() {
        let mut h = Harness::new("calc");
        let calls = counted_sum(&h);

        h.request("sum", json!([2, "three"]), "d1");

        h.expect_silence().await;
        assert!(matches!(
            h.next_event().await,
            DispatchEvent::DecodeFailed { index: 1, ref id, .. } if id == "d1"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_still_serving(&mut h).await;
    }

    #[tokio::test]
    async fn test_unregistered_descriptor_fails_decode() {
        let mut h = Harness::new("geometry");
        h.broker.register_method(
            "area",
            [TypeDescriptor::named("Shape")],
            |_: Arguments| -> Result<Invocation, HandlerError> { Ok(Invocation::resolved(0)) },
            Some(TypeDescriptor::FLOAT),
        );

        h.request("area", json!([{"w": 2}]), "s1");

        h.expect_silence().await;
        assert!(matches!(
            h.next_event().await,
            DispatchEvent::DecodeFailed { index: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_and_foreign_envelopes() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);

        h.send_raw(json!("not an envelope"));
        h.send_raw(json!({"kind": "request", "method": "sum", "args": [1, 2]}));
        h.send_raw(json!({"kind": "cancel", "id": "c1"}));
        h.send_raw(json!({"kind": "result", "value": 1, "id": "x1"}));

        h.expect_silence().await;
        for _ in 0..3 {
            assert!(matches!(
                h.next_event().await,
                DispatchEvent::Malformed { .. }
            ));
        }
        assert_eq!(
            h.next_event().await,
            DispatchEvent::Ignored {
                kind: EnvelopeKind::Result,
                id: "x1".into()
            }
        );
        assert_still_serving(&mut h).await;
    }

    // =============================================================================
    // HANDLER FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_synchronous_handler_error() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        h.broker.register_method(
            "refuse",
            MethodSignature::empty(),
            |_: Arguments| -> Result<Invocation, HandlerError> {
                Err(HandlerError::failed("not today"))
            },
            Some(TypeDescriptor::INT),
        );

        h.request("refuse", json!([]), "h1");

        h.expect_silence().await;
        let event = h
            .event_matching(|e| matches!(e, DispatchEvent::HandlerFailed { .. }))
            .await;
        assert!(matches!(
            event,
            DispatchEvent::HandlerFailed { ref reason, .. } if reason.contains("not today")
        ));
        assert_still_serving(&mut h).await;
    }

    #[tokio::test]
    async fn test_asynchronous_rejection() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        h.broker.register_method(
            "reject_later",
            MethodSignature::empty(),
            |_: Arguments| -> Result<Invocation, HandlerError> {
                Ok(Invocation::pending(async {
                    Err::<i64, _>(HandlerError::failed("rejected"))
                }))
            },
            Some(TypeDescriptor::INT),
        );

        h.request("reject_later", json!([]), "h2");

        h.expect_silence().await;
        assert_eq!(
            h.event_matching(|e| matches!(e, DispatchEvent::HandlerFailed { .. }))
                .await,
            DispatchEvent::HandlerFailed {
                method: "reject_later".into(),
                id: "h2".into(),
                reason: "Handler failed: rejected".into()
            }
        );
        assert_still_serving(&mut h).await;
    }

    #[tokio::test]
    async fn test_result_not_matching_return_type() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        h.broker.register_method(
            "liar",
            MethodSignature::empty(),
            |_: Arguments| -> Result<Invocation, HandlerError> {
                Ok(Invocation::resolved("not a number"))
            },
            Some(TypeDescriptor::INT),
        );

        h.request("liar", json!([]), "l1");

        h.expect_silence().await;
        assert!(matches!(
            h.event_matching(|e| !matches!(e, DispatchEvent::Dispatched { .. }))
                .await,
            DispatchEvent::ResponseFailed { ref id, .. } if id == "l1"
        ));
        assert_still_serving(&mut h).await;
    }
}
