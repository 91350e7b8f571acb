/// Integration tests for result aggregation under concurrent resolution
use push_results::{
    Aggregate, AggregateError, ChannelResponder, Classify, ErrorReport, Outcome, ResponsePayload,
    Status,
};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn counting() -> (Aggregate, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let aggregate = Aggregate::with_responder(move |_: ResponsePayload| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (aggregate, calls)
}

// ==================== Delivery Rules ====================

#[test]
fn test_add_without_resolution_never_delivers() {
    init_tracing();
    let (aggregate, calls) = counting();

    aggregate.add("token-1");
    aggregate.add("token-2");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(aggregate.pending_count(), 2);
}

#[test]
fn test_top_level_failure_with_pending_recipients() {
    init_tracing();
    let (responder, mut rx) = ChannelResponder::channel();
    let aggregate = Aggregate::with_responder(responder);

    let first = aggregate.add("token-1");
    aggregate.add("token-2");
    first.fail(ErrorReport::new("boom", "Internal")).unwrap();

    aggregate
        .fail(ErrorReport::new("Malformed request", "InvalidRequest"))
        .unwrap();

    let payload = rx.try_recv().expect("failure should be delivered");
    assert_eq!(
        payload.to_json().unwrap(),
        r#"{"result":"ERROR","error_message":"Malformed request","error_code":"InvalidRequest"}"#
    );
    assert!(rx.try_recv().is_err());
}

// ==================== Concurrency ====================

#[test]
fn test_racing_threads_deliver_once() {
    init_tracing();

    for _ in 0..50 {
        let (aggregate, calls) = counting();
        let subs: Vec<_> = (0..16).map(|i| aggregate.add(format!("token-{i:02}"))).collect();
        let barrier = Arc::new(Barrier::new(subs.len()));

        let handles: Vec<_> = subs
            .into_iter()
            .enumerate()
            .map(|(i, sub)| {
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    if i % 3 == 0 {
                        sub.fail(ErrorReport::new("rejected", "BadDeviceToken")).unwrap();
                    } else {
                        sub.succeed().unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(aggregate.is_resolved());
    }
}

#[test]
fn test_racing_top_level_failure_delivers_once() {
    init_tracing();

    for round in 0..50 {
        let (aggregate, calls) = counting();
        let subs: Vec<_> = (0..8).map(|i| aggregate.add(format!("token-{i}"))).collect();
        let barrier = Arc::new(Barrier::new(subs.len() + 1));

        let mut handles: Vec<_> = subs
            .into_iter()
            .map(|sub| {
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    sub.succeed().unwrap();
                })
            })
            .collect();

        let top = aggregate.clone();
        let top_barrier = Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            top_barrier.wait();
            // loses the race when every recipient already resolved
            let _ = top.fail(ErrorReport::new(format!("round {round}"), "Internal"));
        }));

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1, "round {round}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tokio_tasks_with_interleaved_adds() {
    init_tracing();
    let (responder, mut rx) = ChannelResponder::channel();
    let aggregate = Aggregate::with_responder(responder);

    // recipients keep arriving while earlier sends complete
    let mut tasks = Vec::new();
    let guard = aggregate.add("guard-token");
    for i in 0..32 {
        let sub = aggregate.add(format!("device-{i:03}"));
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis((i % 5) as u64)).await;
            sub.succeed()
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert!(rx.try_recv().is_err(), "guard recipient is still pending");

    guard.fail(ErrorReport::new("timeout", "ProviderTimeout")).unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let results = payload.recipient_results().unwrap();
    assert_eq!(results.len(), 33);
    assert_eq!(results[0].device_token, "guard-token");
    assert_eq!(results[0].result, Outcome::Error);
    assert_eq!(results[1].device_token, "device-000");
    assert!(results[1..].iter().all(|r| r.result == Outcome::Ok));
    assert_eq!(results[32].device_token, "device-031");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handles_are_shared_across_tasks() {
    init_tracing();
    let (aggregate, calls) = counting();
    let sub = aggregate.add("token-1");

    let racers: Vec<_> = (0..4)
        .map(|_| {
            let sub = sub.clone();
            tokio::spawn(async move { sub.succeed() })
        })
        .collect();

    let mut wins = 0;
    for racer in racers {
        match racer.await.unwrap() {
            Ok(()) => wins += 1,
            Err(err) => assert_eq!(err, AggregateError::AlreadyResolved),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(sub.status(), Status::Ok);
}

// ==================== Error Reports ====================

#[derive(Debug)]
enum SendError {
    Unregistered,
    Timeout(u64),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Unregistered => write!(f, "device is not registered"),
            SendError::Timeout(ms) => write!(f, "provider did not answer within {ms}ms"),
        }
    }
}

impl Classify for SendError {
    fn code(&self) -> &str {
        match self {
            SendError::Unregistered => "Unregistered",
            SendError::Timeout(_) => "Timeout",
        }
    }
}

#[test]
fn test_classified_errors_in_payload() {
    init_tracing();
    let aggregate = Aggregate::without_responder();

    let first = aggregate.add("token-1");
    let second = aggregate.add("token-2");
    first
        .fail(ErrorReport::from_classified(&SendError::Unregistered))
        .unwrap();
    second
        .fail(ErrorReport::from_classified(&SendError::Timeout(500)))
        .unwrap();

    let payload = aggregate.to_payload().unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

    assert_eq!(value["recipient_results"][0]["error_code"], "Unregistered");
    assert_eq!(
        value["recipient_results"][1]["error_message"],
        "provider did not answer within 500ms"
    );
    assert_eq!(value["recipient_results"][1]["result"], "ERROR");
}
