//! End-to-end scenarios: registration conflicts, resource lifecycle,
//! finalizer handshakes, destroy-ready routing and authorization.

use std::time::Duration;

use controlvisor::{
    Config, Input, InputKind, Output, Phase, ReconcileStream, Resource, ResourceId, Runtime,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);

fn rid(id: &str) -> ResourceId {
    ResourceId::new("default", "configs", id)
}

async fn recv(stream: &mut ReconcileStream) {
    timeout(WAIT, stream.next())
        .await
        .expect("expected a reconcile signal")
        .expect("stream closed unexpectedly");
}

async fn assert_quiet(stream: &mut ReconcileStream) {
    assert!(
        timeout(QUIET, stream.next()).await.is_err(),
        "unexpected reconcile signal"
    );
}

#[tokio::test]
async fn s1_registration_output_conflict() {
    let runtime = Runtime::new(Config::default());

    runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();

    let err = runtime
        .register_controller("b", vec![], vec![Output::shared("configs")])
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "output_conflict");
}

#[tokio::test]
async fn s2_create_update_teardown_destroy() {
    let runtime = Runtime::new(Config::default());
    let token = runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    let created = adapter
        .create(&token, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();
    assert_eq!(created.metadata().version, 1);
    assert_eq!(created.metadata().owner, "a");
    assert_eq!(created.metadata().phase, Phase::Running);

    let updated = adapter
        .update(&token, 1, Resource::new("default", "configs", "x", "v2"))
        .await
        .unwrap();
    assert_eq!(updated.metadata().version, 2);
    assert_eq!(updated.spec().bytes(), b"v2");

    let ready = adapter.teardown(&token, &rid("x")).await.unwrap();
    assert!(ready);

    let tearing = adapter.get(&token, &rid("x")).await.unwrap();
    assert_eq!(tearing.metadata().phase, Phase::TearingDown);
    assert_eq!(tearing.metadata().version, 3);

    adapter.destroy(&token, &rid("x")).await.unwrap();
    let err = adapter.get(&token, &rid("x")).await.unwrap_err();
    assert_eq!(err.as_label(), "not_found");
}

#[tokio::test]
async fn s3_finalizer_handshake() {
    let runtime = Runtime::new(Config::default());
    let a = runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();
    let b = runtime
        .register_controller(
            "b",
            vec![Input::namespaced(InputKind::Strong, "default", "configs")],
            vec![],
        )
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    let mut b_stream = adapter.reconcile_events(&b).await.unwrap();
    recv(&mut b_stream).await; // initial kick

    adapter
        .create(&a, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();
    recv(&mut b_stream).await; // creation observed

    adapter
        .add_finalizers(&b, &rid("x"), &["b".to_string()])
        .await
        .unwrap();

    let ready = adapter.teardown(&a, &rid("x")).await.unwrap();
    assert!(!ready);
    recv(&mut b_stream).await; // phase change observed

    adapter
        .remove_finalizers(&b, &rid("x"), &["b".to_string()])
        .await
        .unwrap();

    let ready = adapter.teardown(&a, &rid("x")).await.unwrap();
    assert!(ready);

    adapter.destroy(&a, &rid("x")).await.unwrap();
}

#[tokio::test]
async fn s4_version_mismatch() {
    let runtime = Runtime::new(Config::default());
    let token = runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    adapter
        .create(&token, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();

    adapter
        .update(&token, 1, Resource::new("default", "configs", "x", "v2"))
        .await
        .unwrap();

    let err = adapter
        .update(&token, 1, Resource::new("default", "configs", "x", "v3"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "version_mismatch");
}

#[tokio::test]
async fn s5_destroy_ready_routing() {
    let runtime = Runtime::new(Config::default());
    let token = runtime
        .register_controller(
            "a",
            vec![Input::namespaced(InputKind::DestroyReady, "default", "configs")],
            vec![Output::exclusive("configs")],
        )
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    let mut stream = adapter.reconcile_events(&token).await.unwrap();
    recv(&mut stream).await; // initial kick

    adapter
        .create(&token, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();
    // A RUNNING resource produces no destroy-ready delivery.
    assert_quiet(&mut stream).await;

    let ready = adapter.teardown(&token, &rid("x")).await.unwrap();
    assert!(ready);
    // Tearing down with no finalizers: destroy-ready fires before the
    // resource vanishes.
    recv(&mut stream).await;

    adapter.destroy(&token, &rid("x")).await.unwrap();
    // Destruction emits no further destroy-ready event.
    assert_quiet(&mut stream).await;
}

#[tokio::test]
async fn s6_unauthorized_update() {
    let runtime = Runtime::new(Config::default());
    let token = runtime
        .register_controller(
            "a",
            vec![Input::exact(InputKind::Weak, "default", "configs", "x")],
            vec![],
        )
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    let err = adapter
        .update(&token, 1, Resource::new("default", "configs", "x", "v2"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "not_authorized_for_resource");
}

#[tokio::test]
async fn weak_input_cannot_touch_finalizers() {
    let runtime = Runtime::new(Config::default());
    let a = runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();
    let b = runtime
        .register_controller(
            "b",
            vec![Input::namespaced(InputKind::Weak, "default", "configs")],
            vec![],
        )
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    adapter
        .create(&a, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();

    let err = adapter
        .add_finalizers(&b, &rid("x"), &["b".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "not_authorized_for_resource");
}

#[tokio::test]
async fn shared_outputs_enforce_ownership() {
    let runtime = Runtime::new(Config::default());
    let a = runtime
        .register_controller("a", vec![], vec![Output::shared("links")])
        .await
        .unwrap();
    let b = runtime
        .register_controller("b", vec![], vec![Output::shared("links")])
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    adapter
        .create(&a, Resource::new("default", "links", "l1", "v1"))
        .await
        .unwrap();

    // B may read A's resource (same output type) but not mutate it.
    let resource = adapter
        .get(&b, &ResourceId::new("default", "links", "l1"))
        .await
        .unwrap();
    assert_eq!(resource.metadata().owner, "a");

    let err = adapter
        .update(&b, 1, Resource::new("default", "links", "l1", "v2"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "not_authorized_for_resource");

    // Nor may B claim the same id for itself.
    let err = adapter
        .create(&b, Resource::new("default", "links", "l1", "v2"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "already_exists");
}

#[tokio::test]
async fn update_during_teardown_is_owner_only() {
    let runtime = Runtime::new(Config::default());
    let a = runtime
        .register_controller("a", vec![], vec![Output::shared("links")])
        .await
        .unwrap();
    let b = runtime
        .register_controller("b", vec![], vec![Output::shared("links")])
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    let l1 = ResourceId::new("default", "links", "l1");
    adapter
        .create(&a, Resource::new("default", "links", "l1", "v1"))
        .await
        .unwrap();
    adapter.teardown(&a, &l1).await.unwrap();

    // The owner reacting to its own teardown may still update.
    let updated = adapter
        .update(&a, 2, Resource::new("default", "links", "l1", "draining"))
        .await
        .unwrap();
    assert_eq!(updated.metadata().phase, Phase::TearingDown);

    // Anyone else is rejected before the ownership check even matters:
    // B does not own l1, so the shared-output rule already denies it.
    let err = adapter
        .update(&b, 3, Resource::new("default", "links", "l1", "hijack"))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "not_authorized_for_resource");
}

#[tokio::test]
async fn destroy_guard_requires_teardown_and_no_finalizers() {
    let runtime = Runtime::new(Config::default());
    let a = runtime
        .register_controller("a", vec![], vec![Output::exclusive("configs")])
        .await
        .unwrap();
    let b = runtime
        .register_controller(
            "b",
            vec![Input::namespaced(InputKind::Strong, "default", "configs")],
            vec![],
        )
        .await
        .unwrap();
    runtime.start().await.unwrap();
    let adapter = runtime.adapter();

    adapter
        .create(&a, Resource::new("default", "configs", "x", "v1"))
        .await
        .unwrap();

    // Still RUNNING: destroy is a phase conflict.
    let err = adapter.destroy(&a, &rid("x")).await.unwrap_err();
    assert_eq!(err.as_label(), "phase_conflict");

    adapter
        .add_finalizers(&b, &rid("x"), &["cleanup".to_string()])
        .await
        .unwrap();
    let ready = adapter.teardown(&a, &rid("x")).await.unwrap();
    assert!(!ready);

    // Tearing down but finalizers attached: still undestroyable.
    let err = adapter.destroy(&a, &rid("x")).await.unwrap_err();
    assert_eq!(err.as_label(), "has_finalizers");

    adapter
        .remove_finalizers(&b, &rid("x"), &["cleanup".to_string()])
        .await
        .unwrap();
    adapter.destroy(&a, &rid("x")).await.unwrap();
}
