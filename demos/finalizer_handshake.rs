//! # Example: finalizer handshake between two controllers.
//!
//! `owner` creates a config resource; `janitor` holds a strong input on it
//! and blocks destruction with a finalizer until its cleanup is done.

use std::time::Duration;

use controlvisor::{
    Condition, Config, Input, InputKind, Output, Resource, ResourceId, Runtime,
};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let runtime = Runtime::new(Config::default());

    let owner = runtime
        .register_controller("owner", vec![], vec![Output::exclusive("configs")])
        .await?;
    let janitor = runtime
        .register_controller(
            "janitor",
            vec![Input::namespaced(InputKind::Strong, "default", "configs")],
            vec![],
        )
        .await?;

    runtime.start().await?;
    let adapter = runtime.adapter();
    let rid = ResourceId::new("default", "configs", "x");

    // Janitor: on every change, make sure the finalizer is attached while
    // the resource is running, and release it once teardown begins.
    let janitor_task = {
        let adapter = adapter.clone();
        let rid = rid.clone();
        tokio::spawn(async move {
            let mut stream = adapter.reconcile_events(&janitor).await?;
            while stream.next().await.is_some() {
                let resource = match adapter.get(&janitor, &rid).await {
                    Ok(r) => r,
                    Err(_) => continue,
                };
                match resource.metadata().phase {
                    controlvisor::Phase::Running => {
                        adapter
                            .add_finalizers(&janitor, &rid, &["janitor/cleanup".to_string()])
                            .await?;
                        println!("[janitor] finalizer attached");
                    }
                    controlvisor::Phase::TearingDown => {
                        println!("[janitor] cleaning up…");
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        adapter
                            .remove_finalizers(&janitor, &rid, &["janitor/cleanup".to_string()])
                            .await?;
                        println!("[janitor] finalizer released");
                    }
                }
            }
            anyhow::Ok(())
        })
    };

    // Owner: create, announce teardown, wait for finalizers to clear, destroy.
    adapter
        .create(&owner, Resource::new("default", "configs", "x", "v1"))
        .await?;
    println!("[owner] created {rid}");
    tokio::time::sleep(Duration::from_millis(300)).await;

    let ready = adapter.teardown(&owner, &rid).await?;
    println!("[owner] teardown announced, ready={ready}");

    let outcome = adapter
        .watch_for(&owner, &rid, Condition::FinalizersEmpty, &CancellationToken::new())
        .await?;
    println!("[owner] finalizers cleared (destroyed={})", outcome.destroyed);

    if !outcome.destroyed {
        adapter.destroy(&owner, &rid).await?;
        println!("[owner] destroyed {rid}");
    }

    runtime.stop().await?;
    janitor_task.abort();
    Ok(())
}
