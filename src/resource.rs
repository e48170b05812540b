//! Resources and the paths their channels are derived from.

use crate::scopes::Scope;
use crate::types::{EntityRef, RecordId};

/// One element of a scope chain.
#[derive(Clone, Debug)]
pub enum ScopeRef {
    /// Literal path prefix, e.g. `admin`.
    Named(String),
    /// Parent entity, contributes `<plural>/<id>`.
    Owner(EntityRef),
    /// Bound sync scope, contributes its path segments.
    Scope(Scope),
}

impl ScopeRef {
    pub fn path_segments(&self) -> Vec<String> {
        match self {
            ScopeRef::Named(name) => vec![name.clone()],
            ScopeRef::Owner(owner) => vec![owner.model.plural().to_string(), owner.id_segment()],
            ScopeRef::Scope(scope) => scope.path_segments(),
        }
    }
}

impl From<Scope> for ScopeRef {
    fn from(scope: Scope) -> Self {
        ScopeRef::Scope(scope)
    }
}

impl From<EntityRef> for ScopeRef {
    fn from(owner: EntityRef) -> Self {
        ScopeRef::Owner(owner)
    }
}

impl From<&str> for ScopeRef {
    fn from(name: &str) -> Self {
        ScopeRef::Named(name.to_string())
    }
}

/// An entity placed under an optional scope chain.
///
/// ```text
/// Resource::new(user)                               /users/1
/// Resource::scoped(user, ["admin"])                 /admin/users/1
/// Resource::scoped(user, [project])                 /projects/2/users/1
/// Resource::scoped(user, [User.in_group(group)])    /in_group/group/3/users/1
/// ```
#[derive(Clone, Debug)]
pub struct Resource {
    pub entity: EntityRef,
    pub scopes: Vec<ScopeRef>,
}

impl Resource {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            scopes: Vec::new(),
        }
    }

    pub fn scoped(entity: EntityRef, scopes: Vec<ScopeRef>) -> Self {
        Self { entity, scopes }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.entity.id
    }

    pub fn name(&self) -> &str {
        self.entity.model.singular()
    }

    pub fn base_name(&self) -> &str {
        self.entity.model.base_name()
    }

    pub fn plural_name(&self) -> &str {
        self.entity.model.plural()
    }

    /// Joined scope chain, `/` when unscoped.
    pub fn scopes_path(&self) -> String {
        join_path(self.scope_segments())
    }

    /// Unscoped path of the entity, e.g. `/users/1`.
    pub fn model_path(&self) -> String {
        join_path(vec![self.plural_name().to_string(), self.entity.id_segment()])
    }

    /// Scoped path of the entity, e.g. `/projects/1/todos/2`.
    pub fn polymorphic_path(&self) -> String {
        let mut segments = self.scope_segments();
        segments.push(self.plural_name().to_string());
        segments.push(self.entity.id_segment());
        join_path(segments)
    }

    /// Scoped path for new entities, e.g. `/projects/1/todos/new`.
    pub fn polymorphic_new_path(&self) -> String {
        let mut segments = self.scope_segments();
        segments.push(self.plural_name().to_string());
        segments.push("new".to_string());
        join_path(segments)
    }

    fn scope_segments(&self) -> Vec<String> {
        self.scopes.iter().flat_map(ScopeRef::path_segments).collect()
    }
}

fn join_path(segments: Vec<String>) -> String {
    let parts: Vec<String> = segments.into_iter().filter(|s| !s.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelName;

    fn user() -> EntityRef {
        EntityRef::new(ModelName::new("user"), 1)
    }

    #[test]
    fn test_unscoped_paths() {
        let resource = Resource::new(user());
        assert_eq!(resource.scopes_path(), "/");
        assert_eq!(resource.polymorphic_path(), "/users/1");
        assert_eq!(resource.model_path(), "/users/1");
        assert_eq!(resource.polymorphic_new_path(), "/users/new");
    }

    #[test]
    fn test_named_scopes() {
        let resource = Resource::scoped(user(), vec!["staff".into(), "restricted".into()]);
        assert_eq!(resource.polymorphic_path(), "/staff/restricted/users/1");
        assert_eq!(resource.polymorphic_new_path(), "/staff/restricted/users/new");
        assert_eq!(resource.model_path(), "/users/1");
    }

    #[test]
    fn test_owner_scope() {
        let project = EntityRef::new(ModelName::new("project"), 2);
        let resource = Resource::scoped(user(), vec!["admin".into(), project.into()]);
        assert_eq!(resource.polymorphic_path(), "/admin/projects/2/users/1");
    }

    #[test]
    fn test_unsaved_entity() {
        let resource = Resource::new(EntityRef::unsaved(ModelName::new("user")));
        assert_eq!(resource.model_path(), "/users");
        assert_eq!(resource.polymorphic_new_path(), "/users/new");
    }
}
