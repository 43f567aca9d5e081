// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::IntoFuture;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use logrelay::Backend;
use logrelay::Dispatcher;
use logrelay::Error;
use logrelay::ErrorKind;
use logrelay::Level;
use logrelay::Record;
use logrelay::Trap;
use logrelay::Verdict;
use logrelay::backend::Testing;
use logrelay::stage::AsyncFnStage;
use logrelay::stage::FilterStage;
use logrelay::stage::FnStage;
use tokio::sync::Barrier;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
struct Collect {
    name: &'static str,
    records: Arc<Mutex<Vec<Record>>>,
}

impl Collect {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            records: Arc::default(),
        }
    }

    fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for Collect {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, record: &Record) -> Result<(), Error> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Debug)]
struct Failing;

#[async_trait]
impl Backend for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(&self, _: &Record) -> Result<(), Error> {
        Err(Error::new("connection refused"))
    }
}

#[derive(Debug)]
struct Panicking;

#[async_trait]
impl Backend for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn send(&self, _: &Record) -> Result<(), Error> {
        panic!("sink exploded");
    }
}

#[derive(Debug, Clone)]
struct Gated {
    inner: Collect,
    gate: Arc<Notify>,
}

#[async_trait]
impl Backend for Gated {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, record: &Record) -> Result<(), Error> {
        self.gate.notified().await;
        self.inner.send(record).await
    }
}

#[derive(Debug)]
struct FailingFlush;

#[async_trait]
impl Backend for FailingFlush {
    fn name(&self) -> &str {
        "unflushable"
    }

    async fn send(&self, _: &Record) -> Result<(), Error> {
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        Err(Error::new("disk full"))
    }
}

#[derive(Debug, Clone, Default)]
struct CollectTrap {
    errors: Arc<Mutex<Vec<String>>>,
    backends: Arc<Mutex<Vec<String>>>,
}

impl CollectTrap {
    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn backends(&self) -> Vec<String> {
        self.backends.lock().unwrap().clone()
    }
}

impl Trap for CollectTrap {
    fn trap(&self, err: &Error) {
        self.errors.lock().unwrap().push(err.to_string());
        if let Some(backend) = err.context_value("backend") {
            self.backends.lock().unwrap().push(backend.to_string());
        }
    }
}

fn counting_stage(position: usize, calls: Arc<Mutex<Vec<usize>>>) -> FnStage {
    FnStage::new(move |record| {
        calls.lock().unwrap().push(position);
        Ok(Verdict::Continue(record))
    })
}

#[tokio::test]
async fn test_records_below_min_level_are_skipped() {
    let backend = Collect::new("collect");
    let calls = Arc::new(Mutex::new(vec![]));
    let dispatcher = logrelay::builder()
        .min_level(Level::Info)
        .stage(counting_stage(0, calls.clone()))
        .backend(backend.clone())
        .build()
        .unwrap();

    dispatcher.debug("x").await.unwrap();
    dispatcher.flush().await;
    assert!(backend.records().is_empty());
    assert!(calls.lock().unwrap().is_empty());

    dispatcher.error("y").await.unwrap();
    dispatcher.flush().await;
    let records = backend.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Level::Error);
    assert_eq!(records[0].message(), "y");
    assert_eq!(*calls.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn test_stage_chain_enriches_and_drops() {
    let backend = Collect::new("collect");
    let dispatcher = logrelay::builder()
        .stage(FnStage::new(|record| {
            Ok(Verdict::Continue(record.into_builder().context("a", 1).build()))
        }))
        .stage(FilterStage::new(|record| !record.message().contains("skip")))
        .backend(backend.clone())
        .build()
        .unwrap();

    dispatcher.info("skip-me").await.unwrap();
    dispatcher.flush().await;
    assert!(backend.records().is_empty());

    dispatcher.info("keep-me").await.unwrap();
    dispatcher.flush().await;
    let records = backend.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message(), "keep-me");
    assert_eq!(records[0].context_value("a").unwrap(), 1);
}

#[tokio::test]
async fn test_stages_run_in_order_and_stop_at_drop() {
    let backend = Collect::new("collect");
    let calls = Arc::new(Mutex::new(vec![]));
    let dispatcher = logrelay::builder()
        .stage(counting_stage(0, calls.clone()))
        .stage(counting_stage(1, calls.clone()))
        .stage(FnStage::new(|_| Ok(Verdict::Drop)))
        .stage(counting_stage(3, calls.clone()))
        .backend(backend.clone())
        .build()
        .unwrap();

    dispatcher.warn("dropped").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(*calls.lock().unwrap(), vec![0, 1]);
    assert!(backend.records().is_empty());
}

#[tokio::test]
async fn test_async_stages_run_sequentially() {
    let calls = Arc::new(Mutex::new(vec![]));
    let slow = {
        let calls = calls.clone();
        AsyncFnStage::new(move |record| {
            let calls = calls.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                calls.lock().unwrap().push("slow");
                Ok::<_, Error>(Verdict::Continue(record))
            }
        })
    };
    let fast = {
        let calls = calls.clone();
        FnStage::new(move |record| {
            calls.lock().unwrap().push("fast");
            Ok(Verdict::Continue(record))
        })
    };

    let dispatcher = logrelay::builder().stage(slow).stage(fast).build().unwrap();
    dispatcher.info("ordered").await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["slow", "fast"]);
}

#[tokio::test]
async fn test_stage_error_aborts_dispatch() {
    let backend = Collect::new("collect");
    let dispatcher = logrelay::builder()
        .stage(FnStage::new(|record| Ok(Verdict::Continue(record))))
        .stage(FnStage::new(|_| Err(Error::new("lookup table missing"))))
        .backend(backend.clone())
        .build()
        .unwrap();

    let err = dispatcher.error("boom").await.unwrap_err();
    dispatcher.flush().await;

    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(err.message(), "lookup table missing");
    assert_eq!(err.context_value("stage"), Some("1"));
    assert!(backend.records().is_empty());
}

#[tokio::test]
async fn test_failing_backend_is_isolated() {
    let healthy = Collect::new("healthy");
    let trap = CollectTrap::default();
    let dispatcher = logrelay::builder()
        .backend(Failing)
        .backend(healthy.clone())
        .trap(trap.clone())
        .build()
        .unwrap();

    dispatcher.warn("z").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(healthy.records().len(), 1);
    assert_eq!(healthy.records()[0].message(), "z");
    assert_eq!(trap.backends(), vec!["failing".to_string()]);
    assert!(trap.errors()[0].contains("connection refused"));
}

#[tokio::test]
async fn test_panicking_backend_is_isolated() {
    let healthy = Collect::new("healthy");
    let trap = CollectTrap::default();
    let dispatcher = logrelay::builder()
        .backend(Panicking)
        .backend(healthy.clone())
        .trap(trap.clone())
        .build()
        .unwrap();

    dispatcher.fatal("going down").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(healthy.records().len(), 1);
    assert_eq!(trap.backends(), vec!["panicking".to_string()]);
    assert!(trap.errors()[0].contains("sink exploded"));
}

#[derive(Debug)]
struct Rendezvous {
    name: &'static str,
    barrier: Arc<Barrier>,
}

#[async_trait]
impl Backend for Rendezvous {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, _: &Record) -> Result<(), Error> {
        self.barrier.wait().await;
        Ok(())
    }
}

#[tokio::test]
async fn test_backends_are_delivered_concurrently() {
    // each backend waits for the other, so sequential delivery would never finish
    let barrier = Arc::new(Barrier::new(2));
    let dispatcher = logrelay::builder()
        .backend(Rendezvous {
            name: "left",
            barrier: barrier.clone(),
        })
        .backend(Rendezvous {
            name: "right",
            barrier,
        })
        .build()
        .unwrap();

    dispatcher.info("meet").await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), dispatcher.flush())
        .await
        .expect("deliveries should complete");
}

#[tokio::test]
async fn test_duplicate_backend_keeps_original() {
    let original = Collect::new("primary");
    let duplicate = Collect::new("primary");
    let dispatcher = logrelay::builder()
        .backend(original.clone())
        .backend(Collect::new("secondary"))
        .build()
        .unwrap();

    let err = dispatcher.add_backend(duplicate.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateBackend);
    assert_eq!(dispatcher.backend_names(), vec!["primary", "secondary"]);

    dispatcher.info("hello").await.unwrap();
    dispatcher.flush().await;
    assert_eq!(original.records().len(), 1);
    assert!(duplicate.records().is_empty());
}

#[tokio::test]
async fn test_add_and_remove_backends() {
    let first = Collect::new("first");
    let second = Collect::new("second");
    let dispatcher = logrelay::builder()
        .backend(first.clone())
        .backend(Testing::default())
        .build()
        .unwrap();

    dispatcher.remove_backend("missing");
    assert_eq!(dispatcher.backend_names(), vec!["first", "testing"]);

    dispatcher.add_backend(second.clone()).unwrap();
    dispatcher.info("both").await.unwrap();
    dispatcher.flush().await;

    dispatcher.remove_backend("first");
    assert_eq!(dispatcher.backend_names(), vec!["testing", "second"]);
    dispatcher.info("only second").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(first.records().len(), 1);
    assert_eq!(second.records().len(), 2);
}

#[tokio::test]
async fn test_added_stage_applies_to_later_calls() {
    let backend = Collect::new("collect");
    let dispatcher = logrelay::builder().backend(backend.clone()).build().unwrap();

    dispatcher.info("before").await.unwrap();
    dispatcher.add_stage(FnStage::new(|record| {
        Ok(Verdict::Continue(
            record.into_builder().context("tagged", true).build(),
        ))
    }));
    dispatcher.info("after").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(dispatcher.stage_count(), 1);
    let records = backend.records();
    let before = records.iter().find(|r| r.message() == "before").unwrap();
    let after = records.iter().find(|r| r.message() == "after").unwrap();
    assert!(before.context_value("tagged").is_none());
    assert_eq!(after.context_value("tagged").unwrap(), true);
}

#[tokio::test]
async fn test_log_call_carries_context_and_error() {
    let backend = Collect::new("collect");
    let dispatcher = logrelay::builder().backend(backend.clone()).build().unwrap();

    let cause = std::io::Error::other("disk full");
    dispatcher
        .error("failed to persist session")
        .context("session", "s-1")
        .contexts([("attempt", 3), ("limit", 5)])
        .error(&cause)
        .await
        .unwrap();
    dispatcher.flush().await;

    let records = backend.records();
    let record = &records[0];
    assert_eq!(record.context().len(), 3);
    assert_eq!(record.context_value("attempt").unwrap(), 3);
    let error = record.error().unwrap();
    assert_eq!(error.message(), "disk full");
    assert!(error.name().ends_with("Error"));
}

#[test]
fn test_dispatch_without_runtime_delivers_inline() {
    let backend = Collect::new("collect");
    let dispatcher: Dispatcher = logrelay::builder().backend(backend.clone()).build().unwrap();

    futures::executor::block_on(dispatcher.info("inline").into_future()).unwrap();
    assert_eq!(backend.records().len(), 1);
}

#[tokio::test]
async fn test_log_call_returns_before_delivery_completes() {
    let gated = Gated {
        inner: Collect::new("gated"),
        gate: Arc::new(Notify::new()),
    };
    let dispatcher = logrelay::builder()
        .backend(gated.clone())
        .build()
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), dispatcher.info("pending").into_future())
        .await
        .expect("log call waited for the backend")
        .unwrap();
    assert!(gated.inner.records().is_empty());

    gated.gate.notify_one();
    dispatcher.flush().await;
    assert_eq!(gated.inner.records().len(), 1);
}

#[tokio::test]
async fn test_flush_failures_are_trapped() {
    let trap = CollectTrap::default();
    let healthy = Collect::new("healthy");
    let dispatcher = logrelay::builder()
        .backend(FailingFlush)
        .backend(healthy.clone())
        .trap(trap.clone())
        .build()
        .unwrap();

    dispatcher.info("before flush").await.unwrap();
    dispatcher.flush().await;

    assert_eq!(healthy.records().len(), 1);
    assert_eq!(trap.backends(), vec!["unflushable"]);
    let errors = trap.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed to flush backend"));
    assert!(errors[0].contains("disk full"));
}
