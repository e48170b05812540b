//! Entry points wired to the ORM lifecycle hooks.

use crate::clients::HttpTransport;
use crate::config::SyncConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::model::{Action, ModelRegistry, Transition};
use crate::partials::Renderer;
use crate::reactor::Reactor;
use crate::refetch::Refetcher;
use crate::types::{LifecycleEvent, Record, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The sync engine: registered models plus the dispatcher publishing for
/// them.
pub struct RenderSync {
    registry: Arc<ModelRegistry>,
    dispatcher: Dispatcher,
    reactor: Option<Arc<Reactor>>,
}

impl RenderSync {
    pub fn new(registry: Arc<ModelRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher,
            reactor: None,
        }
    }

    /// Engine publishing over HTTP with `reqwest`.
    pub fn from_config(
        config: &SyncConfig,
        registry: Arc<ModelRegistry>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        let transport = Arc::new(config.transport()?);
        Self::with_transport(config, registry, renderer, transport)
    }

    /// Engine publishing through `transport`.
    pub fn with_transport(
        config: &SyncConfig,
        registry: Arc<ModelRegistry>,
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let reactor = Arc::new(Reactor::new());
        let client = config.build_client(transport, &reactor)?;
        let dispatcher = Dispatcher::new(client, config.catalog(), renderer);
        Ok(Self {
            registry,
            dispatcher,
            reactor: Some(reactor),
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn reactor(&self) -> Option<&Arc<Reactor>> {
        self.reactor.as_ref()
    }

    /// Refetch endpoint sharing this engine's catalog and channel secret.
    pub fn refetcher(&self) -> Refetcher {
        Refetcher::new(
            Arc::clone(&self.registry),
            self.dispatcher.catalog().clone(),
            self.dispatcher.signer().clone(),
        )
    }

    /// Run `work` with syncing enabled.
    ///
    /// Lifecycle hooks only exist on the `UnitOfWork` handed to `work`, so
    /// syncing ends when the closure returns or unwinds. `renderer`
    /// overrides the engine's renderer for this unit of work.
    pub fn enable<T, F>(&self, renderer: Option<Arc<dyn Renderer>>, work: F) -> T
    where
        F: FnOnce(&UnitOfWork<'_>) -> T,
    {
        let dispatcher = match renderer {
            Some(renderer) => self.dispatcher.with_renderer(renderer),
            None => self.dispatcher.clone(),
        };
        let uow = UnitOfWork {
            registry: &self.registry,
            dispatcher,
        };
        work(&uow)
    }

    /// Stop the reactor, letting queued publishes finish.
    pub fn shutdown(&self) {
        if let Some(reactor) = &self.reactor {
            reactor.stop();
        }
    }
}

/// Syncing context of one request or transaction.
pub struct UnitOfWork<'a> {
    registry: &'a ModelRegistry,
    dispatcher: Dispatcher,
}

impl<'a> UnitOfWork<'a> {
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn on_before_create(&self, record: &Record) -> Result<Transition> {
        let model = self.registry.require(&record.model)?;
        Ok(Transition::new(model, LifecycleEvent::Create))
    }

    /// Capture scope membership before an update.
    ///
    /// `record` carries the pending changes; `original_values` the
    /// persisted value of every changed attribute.
    pub fn on_before_update(
        &self,
        record: &Record,
        original_values: &BTreeMap<String, Value>,
    ) -> Result<Transition> {
        let model = self.registry.require(&record.model)?;
        Ok(Transition::update(model, record, original_values))
    }

    /// Plan a destroy while the record is still in the data store.
    pub fn on_before_destroy(&self, record: &Record) -> Result<Transition> {
        let model = self.registry.require(&record.model)?;
        let mut transition = Transition::new(model, LifecycleEvent::Destroy);
        transition.prepare(record);
        Ok(transition)
    }

    /// Publish the actions of a committed transition.
    ///
    /// Returns the actions in the order they were published. A failed
    /// synchronous publish stops the flush and is returned.
    pub fn on_after_commit(&self, mut transition: Transition, record: &Record) -> Result<Vec<Action>> {
        transition.prepare(record);
        let actions = transition.take_queued();
        for action in &actions {
            self.dispatcher.perform(action)?;
        }
        debug!(
            model = %record.model,
            event = ?transition.event(),
            actions = actions.len(),
            "flushed sync actions"
        );
        Ok(actions)
    }

    /// Forget a rolled-back transition.
    pub fn on_rollback(&self, transition: Transition) {
        transition.discard();
    }
}
