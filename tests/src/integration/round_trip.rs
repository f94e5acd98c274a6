//! # Round-Trip Flows
//!
//! A request goes in, the handler runs, and exactly one result envelope with
//! the request's id comes back, unless no return type was declared.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use service_broker::{
        Arguments, ClientMessageBroker, DispatchEvent, FnArg, HandlerError, Invocation,
        MethodSignature,
    };
    use shared_types::TypeDescriptor;
    use tokio::sync::oneshot;

    use crate::integration::fixtures::{register_sum, Harness, WAIT};

    // =============================================================================
    // REQUEST -> RESULT
    // =============================================================================

    #[tokio::test]
    async fn test_sum_returns_correlated_result() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);

        h.request("sum", json!([2, 3]), "r1");

        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": 5, "id": "r1"})
        );
        assert_eq!(
            h.event_matching(|e| matches!(e, DispatchEvent::Responded { .. }))
                .await,
            DispatchEvent::Responded {
                method: "sum".into(),
                id: "r1".into()
            }
        );
        h.expect_silence().await;
    }

    #[tokio::test]
    async fn test_missing_args_field_means_no_arguments() {
        let mut h = Harness::new("calc");
        h.broker.register_method(
            "answer",
            MethodSignature::empty(),
            |_: Arguments| -> Result<Invocation, HandlerError> { Ok(Invocation::resolved(42)) },
            Some(TypeDescriptor::INT),
        );

        h.send_raw(json!({"kind": "request", "method": "answer", "id": "a1"}));

        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": 42, "id": "a1"})
        );
    }

    #[tokio::test]
    async fn test_custom_type_round_trip() {
        #[derive(Serialize, Deserialize)]
        struct Point {
            x: i64,
            y: i64,
        }

        let mut h = Harness::new("geometry");
        let point = TypeDescriptor::named("Point");
        h.serializer.register_type::<Point>(point.clone());
        h.broker.register_method(
            "translate",
            [point.clone(), TypeDescriptor::INT],
            |args: Arguments| -> Result<Invocation, HandlerError> {
                let p: Point = args.get(0)?;
                let by: i64 = args.get(1)?;
                Ok(Invocation::resolved(Point {
                    x: p.x + by,
                    y: p.y + by,
                }))
            },
            Some(point),
        );

        h.request("translate", json!([{"x": 1, "y": 2}, 10]), "t1");

        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": {"x": 11, "y": 12}, "id": "t1"})
        );
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut h = Harness::new("calc");
        for version in [1, 2] {
            h.broker.register_method(
                "version",
                MethodSignature::empty(),
                move |_: Arguments| -> Result<Invocation, HandlerError> {
                    Ok(Invocation::resolved(version))
                },
                Some(TypeDescriptor::INT),
            );
        }

        h.request("version", json!([]), "v1");

        assert_eq!(h.next_result().await["value"], 2);
        assert_eq!(h.broker.registered_methods().await, vec!["version"]);
    }

    #[tokio::test]
    async fn test_registration_visible_to_next_request() {
        let mut h = Harness::new("calc");

        // No await between registering and sending.
        register_sum(&h.broker);
        h.request("sum", json!([1, 1]), "now");

        assert_eq!(h.next_result().await["value"], 2);
    }

    // =============================================================================
    // NO RESULT EXPECTED
    // =============================================================================

    #[tokio::test]
    async fn test_fire_and_forget_runs_but_sends_nothing() {
        let mut h = Harness::new("events");
        let (done_tx, done_rx) = oneshot::channel::<i64>();
        let done_tx = Arc::new(std::sync::Mutex::new(Some(done_tx)));

        h.broker.register_method(
            "record",
            [TypeDescriptor::INT],
            move |args: Arguments| -> Result<Invocation, HandlerError> {
                let n: i64 = args.get(0)?;
                let done_tx = done_tx.clone();
                Ok(Invocation::pending(async move {
                    if let Some(tx) = done_tx.lock().expect("lock").take() {
                        let _ = tx.send(n);
                    }
                    Ok(n)
                }))
            },
            None,
        );

        h.request("record", json!([7]), "f1");

        let recorded = tokio::time::timeout(WAIT, done_rx).await.unwrap().unwrap();
        assert_eq!(recorded, 7);
        h.expect_silence().await;
        assert_eq!(
            h.next_event().await,
            DispatchEvent::Dispatched {
                method: "record".into(),
                id: "f1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_absent_value_sends_nothing_even_with_return_type() {
        let mut h = Harness::new("calc");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        h.broker.register_method(
            "touch",
            MethodSignature::empty(),
            move |_: Arguments| -> Result<Invocation, HandlerError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Invocation::absent())
            },
            Some(TypeDescriptor::INT),
        );

        h.request("touch", json!([]), "t1");

        h.expect_silence().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // =============================================================================
    // CLIENT BROKER
    // =============================================================================

    #[tokio::test]
    async fn test_client_call_round_trip() {
        let h = Harness::new("calc");
        register_sum(&h.broker);
        let client =
            ClientMessageBroker::new(&h.client_end, h.serializer.clone(), "calc").expect("client");

        let value = client
            .call_with_timeout(
                "sum",
                vec![
                    FnArg::new(40, TypeDescriptor::INT),
                    FnArg::new(2, TypeDescriptor::INT),
                ],
                Some(TypeDescriptor::INT),
                Duration::from_secs(1),
            )
            .await
            .expect("call");

        assert_eq!(value, Some(json!(42)));
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_client_call_to_unknown_method_times_out() {
        let h = Harness::new("calc");
        let client =
            ClientMessageBroker::new(&h.client_end, h.serializer.clone(), "calc").expect("client");

        let err = client
            .call_with_timeout(
                "nope",
                vec![],
                Some(TypeDescriptor::INT),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            service_broker::ClientError::Timeout { timeout_ms: 50, .. }
        ));
    }
}
