//! # Render Sync
//!
//! Scope-aware change detection and pub/sub notification of rendered
//! partials.
//!
//! ## Core Concepts
//!
//! - **Scopes**: Named, parameterized record subsets whose membership is
//!   diffed across every update
//! - **Actions**: New/update/destroy directives planned per record
//!   transition, including touches of related records
//! - **Channels**: HMAC-signed names derived from a resource's path, so
//!   server and browser agree without a handshake
//! - **Clients**: Faye, Pusher or a null broker, publishing synchronously
//!   or on a background reactor
//!
//! ## Example
//!
//! ```ignore
//! use render_sync::{ModelName, ModelRegistry, ModelType, RenderSync, SyncActions, SyncConfig};
//!
//! let registry = Arc::new(ModelRegistry::new());
//! let users = MemoryTable::new(ModelName::new("user"));
//! let table = Arc::clone(&users);
//! registry.register(
//!     ModelType::new(ModelName::new("user"))
//!         .attributes(&["group"])
//!         .sync(SyncActions::all())
//!         .sync_scope("in_group", &["group"], move |args| {
//!             let group = args[0].entity_arg("group")?.clone();
//!             Ok(table.filter(move |row| row.get("group").as_entity() == Some(&group)))
//!         })?,
//! );
//!
//! let sync = RenderSync::from_config(&config, registry, renderer)?;
//! sync.enable(None, |uow| {
//!     let transition = uow.on_before_create(&user)?;
//!     let user = users.insert(user);
//!     uow.on_after_commit(transition, &user)
//! })?;
//! ```

pub mod channel;
pub mod clients;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod extension;
pub mod model;
pub mod partials;
pub mod reactor;
pub mod refetch;
pub mod resource;
pub mod scopes;
pub mod types;

// Re-exports
pub use channel::{ChannelSigner, Normalization};
pub use clients::{
    Client, Delivery, FayeClient, HttpTransport, Message, NullClient, PusherApp, PusherClient,
    ReqwestTransport, BATCH_CHANNEL, DUMMY_AUTH_TOKEN,
};
pub use config::{Adapter, SyncConfig};
pub use dispatch::Dispatcher;
pub use engine::{RenderSync, UnitOfWork};
pub use error::{EvaluationError, RefetchError, Result, SyncError};
pub use extension::{FayeExtension, INVALID_TOKEN};
pub use model::{
    Action, ActionPlanner, ChangeSnapshot, ChangeTracker, ModelRegistry, ModelType, ScopeDiff,
    SyncActions, Transition,
};
pub use partials::{
    CreatorSubscription, Partial, PartialCatalog, PartialCreator, PartialFile,
    PartialSubscription, Renderer,
};
pub use reactor::{Reactor, ReactorState};
pub use refetch::{RecordLoader, RefetchRequest, RefetchResponse, Refetcher};
pub use resource::{Resource, ScopeRef};
pub use scopes::{MemoryTable, Relation, Scope, ScopeDefinition};
pub use types::{EntityRef, LifecycleEvent, Locals, ModelName, Record, RecordId, SyncAction, Value};
