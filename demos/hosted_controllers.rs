//! # Example: hosted controllers with the LogWriter subscriber.
//!
//! Run with: `cargo run --example hosted_controllers --features logging`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use controlvisor::{
    Config, Controller, ControllerError, Input, InputKind, LabelQuery, LogWriter, Output,
    ReconcileContext, Resource, Runtime, RuntimeError, Subscribe,
};

/// Ensures a fixed set of config resources exists.
struct ConfigSeeder {
    ids: Vec<&'static str>,
}

#[async_trait]
impl Controller for ConfigSeeder {
    fn name(&self) -> &str {
        "config-seeder"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![Output::exclusive("configs")]
    }

    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        for id in &self.ids {
            let rid = controlvisor::ResourceId::new("default", "configs", *id);
            match cx.get(&rid).await {
                Ok(_) => {}
                Err(RuntimeError::NotFound { .. }) => {
                    cx.create(Resource::new("default", "configs", *id, "seeded"))
                        .await?;
                    println!("[seeder] created {rid}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Prints an inventory of configs on every change.
struct Auditor;

#[async_trait]
impl Controller for Auditor {
    fn name(&self) -> &str {
        "auditor"
    }

    fn inputs(&self) -> Vec<Input> {
        vec![Input::namespaced(InputKind::Weak, "default", "configs")]
    }

    fn outputs(&self) -> Vec<Output> {
        vec![]
    }

    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        let configs = cx.list("default", "configs", &LabelQuery::any()).await?;
        let ids: Vec<&str> = configs.iter().map(|r| r.metadata().id.as_str()).collect();
        println!("[auditor] configs: {ids:?}");
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let runtime = Runtime::builder(Config::default())
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
        .build();

    runtime
        .host(Arc::new(ConfigSeeder {
            ids: vec!["net", "disk", "boot"],
        }))
        .await?;
    runtime.host(Arc::new(Auditor)).await?;

    runtime.start().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    runtime.stop().await?;
    Ok(())
}
