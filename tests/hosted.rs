//! Hosting: controllers driven in-process by runtime actors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use controlvisor::{
    Config, Controller, ControllerError, Input, InputKind, Output, Phase, ReconcileContext,
    Resource, ResourceId, Runtime,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);

fn rid(id: &str) -> ResourceId {
    ResourceId::new("default", "configs", id)
}

/// Creates one `configs` resource and keeps it converged.
struct Producer;

#[async_trait]
impl Controller for Producer {
    fn name(&self) -> &str {
        "producer"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![Output::exclusive("configs")]
    }

    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        match cx.get(&rid("x")).await {
            Ok(_) => Ok(()),
            Err(controlvisor::RuntimeError::NotFound { .. }) => {
                cx.create(Resource::new("default", "configs", "x", "v1"))
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Tags every observed `configs` resource with a label.
struct Follower {
    seen: AtomicU64,
}

#[async_trait]
impl Controller for Follower {
    fn name(&self) -> &str {
        "follower"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![Input::namespaced(InputKind::Strong, "default", "configs")]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![]
    }

    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        let resources = cx
            .list("default", "configs", &controlvisor::LabelQuery::any())
            .await?;
        self.seen.fetch_add(resources.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

#[tokio::test]
async fn hosted_controllers_converge() {
    let runtime = Runtime::new(Config::default());
    let follower = Arc::new(Follower {
        seen: AtomicU64::new(0),
    });

    let producer_token = runtime.host(Arc::new(Producer)).await.unwrap();
    runtime.host(Arc::clone(&follower) as Arc<dyn Controller>).await.unwrap();
    runtime.start().await.unwrap();

    // The producer's initial kick creates the resource; the follower's
    // watch picks it up.
    let adapter = runtime.adapter();
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        if adapter.get(&producer_token, &rid("x")).await.is_ok()
            && follower.seen.load(Ordering::Relaxed) > 0
        {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "controllers did not converge in time"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let resource = adapter.get(&producer_token, &rid("x")).await.unwrap();
    assert_eq!(resource.metadata().owner, "producer");
    assert_eq!(resource.metadata().phase, Phase::Running);

    runtime.stop().await.unwrap();
}

/// Fails a fixed number of times before succeeding.
struct Flaky {
    attempts: AtomicU64,
    failures: u64,
}

#[async_trait]
impl Controller for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![]
    }

    async fn reconcile(&self, _cx: &ReconcileContext) -> Result<(), ControllerError> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt <= self.failures {
            Err(ControllerError::fail(format!("attempt {attempt} boom")))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn failed_reconciles_are_retried_with_backoff() {
    let mut cfg = Config::default();
    cfg.reconcile_backoff.first = Duration::from_millis(10);
    cfg.reconcile_backoff.max = Duration::from_millis(50);

    let runtime = Runtime::new(cfg);
    let flaky = Arc::new(Flaky {
        attempts: AtomicU64::new(0),
        failures: 3,
    });
    runtime.host(Arc::clone(&flaky) as Arc<dyn Controller>).await.unwrap();
    runtime.start().await.unwrap();

    let deadline = tokio::time::Instant::now() + WAIT;
    while flaky.attempts.load(Ordering::Relaxed) < 4 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "retries did not complete in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    runtime.stop().await.unwrap();
}

/// Blocks until cancelled, checking the context cooperatively.
struct Cooperative;

#[async_trait]
impl Controller for Cooperative {
    fn name(&self) -> &str {
        "cooperative"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![]
    }

    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        while !cx.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Err(ControllerError::Canceled)
    }
}

#[tokio::test]
async fn stop_waits_for_cooperative_controllers() {
    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(2);

    let runtime = Runtime::new(cfg);
    runtime.host(Arc::new(Cooperative)).await.unwrap();
    runtime.start().await.unwrap();

    // Give the actor time to enter its reconcile body.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A cooperative controller exits within the grace period.
    timeout(WAIT, runtime.stop())
        .await
        .expect("stop must return")
        .unwrap();
}
