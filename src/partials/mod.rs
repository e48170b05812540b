//! Partial templates, their channels and the renderer seam.
//!
//! Synced partials live under `<views_root>/<plural>/_<name>.<ext>`;
//! refetch partials under `<views_root>/<plural>/refetch/`. The crate never
//! renders templates itself: every body comes from a `Renderer`.

mod catalog;
mod partial;
mod subscription;

pub use catalog::{PartialCatalog, PartialFile};
pub use partial::{Partial, PartialCreator};
pub use subscription::{CreatorSubscription, PartialSubscription};

use crate::error::Result;
use crate::types::Locals;

/// Template rendering collaborator.
pub trait Renderer: Send + Sync {
    /// Render the partial at `partial_path` with `locals`.
    fn render_to_string(&self, partial_path: &str, locals: &Locals) -> Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &Locals) -> Result<String> + Send + Sync,
{
    fn render_to_string(&self, partial_path: &str, locals: &Locals) -> Result<String> {
        self(partial_path, locals)
    }
}
