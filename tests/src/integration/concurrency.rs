//! # Concurrency
//!
//! Dispatch happens in delivery order, but asynchronous results are sent as
//! they resolve. Only the `id` ties a result to its request.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::future::join_all;
    use serde_json::{json, Value};
    use service_broker::{
        Arguments, ClientMessageBroker, DispatchEvent, FnArg, HandlerError, Invocation,
        JsonSerializer, ServiceMessageBrokerFactory,
    };
    use shared_bus::InMemoryMessageBus;
    use shared_types::TypeDescriptor;
    use tokio::sync::Notify;

    use crate::integration::fixtures::{register_delayed, register_sum, Harness};

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_completion_order() {
        let mut h = Harness::new("calc");
        register_delayed(&h.broker);

        h.request("delayed", json!(["slow", 200]), "a");
        h.request("delayed", json!(["fast", 10]), "b");

        let first = h.next_result().await;
        let second = h.next_result().await;
        assert_eq!(first, json!({"kind": "result", "value": "fast", "id": "b"}));
        assert_eq!(second, json!({"kind": "result", "value": "slow", "id": "a"}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_slow_methods_answer_independently() {
        let mut h = Harness::new("calc");
        register_delayed(&h.broker);
        h.broker.register_method(
            "shout",
            [TypeDescriptor::STRING],
            |args: Arguments| -> Result<Invocation, HandlerError> {
                let text: String = args.get(0)?;
                Ok(Invocation::pending(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, HandlerError>(text.to_uppercase())
                }))
            },
            Some(TypeDescriptor::STRING),
        );

        h.request("delayed", json!(["quiet", 300]), "d1");
        h.request("shout", json!(["loud"]), "s1");

        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": "LOUD", "id": "s1"})
        );
        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": "quiet", "id": "d1"})
        );
    }

    #[tokio::test]
    async fn test_pending_result_does_not_block_dispatch() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        let gate = Arc::new(Notify::new());
        let waiter = gate.clone();
        h.broker.register_method(
            "gated",
            [TypeDescriptor::STRING],
            move |args: Arguments| -> Result<Invocation, HandlerError> {
                let label: String = args.get(0)?;
                let waiter = waiter.clone();
                Ok(Invocation::pending(async move {
                    waiter.notified().await;
                    Ok(label)
                }))
            },
            Some(TypeDescriptor::STRING),
        );

        h.request("gated", json!(["held"]), "g1");
        h.request("sum", json!([1, 2]), "s1");

        assert_eq!(h.next_result().await["id"], "s1");
        gate.notify_one();
        assert_eq!(
            h.next_result().await,
            json!({"kind": "result", "value": "held", "id": "g1"})
        );
    }

    #[tokio::test]
    async fn test_resolved_results_answered_before_backlog() {
        let mut h = Harness::new("calc");
        register_sum(&h.broker);
        assert_eq!(h.broker.registered_methods().await, vec!["sum"]);

        for id in ["a", "b", "c"] {
            h.request("sum", json!([1, 1]), id);
        }

        let mut order = Vec::new();
        for _ in 0..6 {
            let event = h.next_event().await;
            let (outcome, id) = match &event {
                DispatchEvent::Dispatched { id, .. } | DispatchEvent::Responded { id, .. } => {
                    (event.outcome(), id.clone())
                }
                other => panic!("unexpected event {other:?}"),
            };
            order.push(format!("{outcome}:{id}"));
        }

        assert_eq!(
            order,
            vec![
                "dispatched:a",
                "responded:a",
                "dispatched:b",
                "responded:b",
                "dispatched:c",
                "responded:c"
            ]
        );
    }

    #[tokio::test]
    async fn test_handlers_invoked_in_delivery_order() {
        let mut h = Harness::new("log");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        h.broker.register_method(
            "append",
            [TypeDescriptor::INT],
            move |args: Arguments| -> Result<Invocation, HandlerError> {
                let n: i64 = args.get(0)?;
                recorder.lock().expect("lock").push(n);
                Ok(Invocation::resolved(n))
            },
            Some(TypeDescriptor::INT),
        );

        for n in 0..20 {
            h.request("append", json!([n]), &format!("n{n}"));
        }
        for _ in 0..20 {
            h.next_result().await;
        }

        assert_eq!(*seen.lock().expect("lock"), (0..20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_many_in_flight_requests_keep_their_ids() {
        let mut h = Harness::new("calc");
        register_delayed(&h.broker);

        // Later requests finish first.
        for i in 0..25u64 {
            h.request("delayed", json!([i, 5 * (25 - i)]), &format!("req-{i}"));
        }

        let mut results: HashMap<String, Value> = HashMap::new();
        for _ in 0..25 {
            let result = h.next_result().await;
            let id = result["id"].as_str().expect("id").to_string();
            assert!(results.insert(id, result["value"].clone()).is_none());
        }

        for i in 0..25u64 {
            assert_eq!(results[&format!("req-{i}")], json!(i));
        }
        h.expect_silence().await;
    }

    #[tokio::test]
    async fn test_concurrent_client_calls() {
        let h = Harness::new("calc");
        register_delayed(&h.broker);
        let client =
            ClientMessageBroker::new(&h.client_end, h.serializer.clone(), "calc").expect("client");

        let calls = (0..10i64).map(|i| {
            client.call_with_timeout(
                "delayed",
                vec![
                    FnArg::primitive(i),
                    FnArg::new(10 * (10 - i), TypeDescriptor::INT),
                ],
                Some(TypeDescriptor::PRIMITIVE),
                Duration::from_secs(2),
            )
        });
        let results = join_all(calls).await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.expect("call"), Some(json!(i)));
        }
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_brokers_on_separate_channels_are_independent() {
        let (service_end, client_end) = InMemoryMessageBus::pair();
        let serializer = Arc::new(JsonSerializer::new());
        let factory = ServiceMessageBrokerFactory::new(Arc::new(service_end), serializer.clone());

        let adder = factory.create_broker("adder").expect("adder");
        register_sum(&adder);
        let greeter = factory.create_broker_with("greeter", false).expect("greeter");
        greeter.register_method(
            "sum",
            [TypeDescriptor::STRING, TypeDescriptor::STRING],
            |args: Arguments| -> Result<Invocation, HandlerError> {
                let a: String = args.get(0)?;
                let b: String = args.get(1)?;
                Ok(Invocation::resolved(format!("{a}{b}")))
            },
            Some(TypeDescriptor::STRING),
        );

        let adder_client =
            ClientMessageBroker::new(&client_end, serializer.clone(), "adder").expect("client");
        let greeter_client =
            ClientMessageBroker::new(&client_end, serializer, "greeter").expect("client");
        assert!(client_end.runs_on_host_loop("greeter").is_some());

        let (number, text) = tokio::join!(
            adder_client.call_with_timeout(
                "sum",
                vec![
                    FnArg::new(1, TypeDescriptor::INT),
                    FnArg::new(2, TypeDescriptor::INT)
                ],
                Some(TypeDescriptor::INT),
                Duration::from_secs(1),
            ),
            greeter_client.call_with_timeout(
                "sum",
                vec![
                    FnArg::new("ab", TypeDescriptor::STRING),
                    FnArg::new("cd", TypeDescriptor::STRING)
                ],
                Some(TypeDescriptor::STRING),
                Duration::from_secs(1),
            ),
        );

        assert_eq!(number.expect("adder"), Some(json!(3)));
        assert_eq!(text.expect("greeter"), Some(json!("abcd")));
    }
}
