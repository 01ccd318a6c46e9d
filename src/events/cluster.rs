//! Event listing from a live cluster

use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::core::v1::Event;
use kube::api::{Api, ListParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use std::thread;
use tracing::debug;

use super::{EventRecord, EventSource};

/// Lists `core/v1` events through the Kubernetes API
#[derive(Clone, Debug, Default)]
pub struct KubeEventSource {
    context: Option<String>,
}

impl KubeEventSource {
    /// Use the default kubeconfig or in-cluster configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a named kubeconfig context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    async fn client(&self) -> Result<Client> {
        match &self.context {
            None => Client::try_default()
                .await
                .context("Failed to create Kubernetes client"),
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..Default::default()
                };
                let config = Config::from_kubeconfig(&options)
                    .await
                    .with_context(|| format!("Failed to load kubeconfig context {context}"))?;
                Client::try_from(config).context("Failed to create Kubernetes client from config")
            }
        }
    }

    /// List the events of `namespace`, oldest first
    pub async fn list(&self, namespace: &str) -> Result<Vec<EventRecord>> {
        let client = self.client().await?;
        let api: Api<Event> = Api::namespaced(client, namespace);

        let events = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list events in namespace {namespace}"))?;

        let mut records: Vec<EventRecord> = events.items.iter().map(EventRecord::from).collect();
        records.sort_by_key(|r| r.last_seen);

        debug!(namespace, count = records.len(), "Listed events");
        Ok(records)
    }
}

impl EventSource for KubeEventSource {
    /// Runs on its own thread and runtime, so callers may or may not be
    /// inside a tokio runtime already.
    fn events(&self, namespace: &str) -> Result<Vec<EventRecord>> {
        thread::scope(|scope| {
            let listing = scope.spawn(|| {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("Failed to start event listing runtime")?;
                runtime.block_on(self.list(namespace))
            });

            match listing.join() {
                Ok(result) => result,
                Err(_) => Err(anyhow!("Event listing thread panicked")),
            }
        })
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let object = &event.involved_object;
        let last_seen = event
            .last_timestamp
            .as_ref()
            .map(|t| t.0)
            .or_else(|| event.event_time.as_ref().map(|t| t.0))
            .or_else(|| event.metadata.creation_timestamp.as_ref().map(|t| t.0));

        Self {
            event_type: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            kind: object.kind.clone().unwrap_or_default(),
            name: object.name.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            count: event.count.unwrap_or(1),
            last_seen,
        }
    }
}
