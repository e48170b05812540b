//! Sync scopes: named, parameterized subsets of a model's records.
//!
//! A [`ScopeDefinition`] is registered once per model. A [`Scope`] binds a
//! definition to arguments, either explicitly or by reading them off a
//! model instance, and answers membership questions against the data
//! store through a [`Relation`].
//!
//! Evaluation failures are expected: a scope whose argument is a nil
//! association is simply inapplicable, and callers treat it as "not a
//! member".
//!
//! # Example
//!
//! ```ignore
//! let users = MemoryTable::new(ModelName::new("user"));
//! let table = Arc::clone(&users);
//! let user = ModelType::new(ModelName::new("user"))
//!     .attributes(&["group", "age"])
//!     .sync(SyncActions::all())
//!     .sync_scope("in_group", &["group"], move |args| {
//!         let group = args[0].entity_arg("group")?.clone();
//!         Ok(table.filter(move |row| row.get("group").as_entity() == Some(&group)))
//!     })?;
//!
//! let scope = user.bind("in_group", vec![Value::Entity(group)])?;
//! assert_eq!(scope.polymorphic_path(), "/in_group/group/1");
//! ```

mod definition;
mod relation;
mod scope;

pub use definition::{Method, ParamSource, Predicate, ScopeDefinition};
pub use relation::{MemoryTable, Relation};
pub use scope::Scope;
