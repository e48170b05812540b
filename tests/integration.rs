//! Integration tests for the sync lifecycle.

use parking_lot::Mutex;
use render_sync::{
    Adapter, ChannelSigner, EntityRef, HttpTransport, Locals, MemoryTable, ModelName,
    ModelRegistry, ModelType, Normalization, Record, RenderSync, Renderer, Result, SyncAction,
    SyncActions, SyncConfig, Value, BATCH_CHANNEL,
};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const SERVER: &str = "http://localhost:9292/faye";
const SECRET: &str = "secret";

#[derive(Default)]
struct RecordingTransport {
    posts: Mutex<Vec<Json>>,
}

impl RecordingTransport {
    fn take(&self) -> Vec<Json> {
        std::mem::take(&mut *self.posts.lock())
    }
}

impl HttpTransport for RecordingTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<()> {
        assert_eq!(url, SERVER);
        let message = serde_json::from_str(form[0].1).unwrap();
        self.posts.lock().push(message);
        Ok(())
    }

    fn post_json(&self, _url: &str, _body: &str) -> Result<()> {
        unreachable!("faye posts forms")
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn group(id: u64) -> EntityRef {
    EntityRef::new(ModelName::new("group"), id)
}

struct Fixture {
    _views: TempDir,
    users: Arc<MemoryTable>,
    transport: Arc<RecordingTransport>,
    sync: RenderSync,
}

fn fixture() -> Fixture {
    init_tracing();

    let views = TempDir::new().unwrap();
    fs::create_dir_all(views.path().join("users")).unwrap();
    fs::write(views.path().join("users").join("_user_row.html.erb"), "").unwrap();

    let users = MemoryTable::new(ModelName::new("user"));
    let table = Arc::clone(&users);
    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        ModelType::new(ModelName::new("user"))
            .attributes(&["name", "group"])
            .sync(SyncActions::all())
            .sync_scope("in_group", &["group"], move |args| {
                let group = args[0].entity_arg("group")?.clone();
                Ok(table.filter(move |row| row.get("group").as_entity() == Some(&group)))
            })
            .unwrap(),
    );

    let config = SyncConfig {
        server: Some(SERVER.to_string()),
        auth_token: Some(SECRET.to_string()),
        adapter: Some(Adapter::Faye),
        views_root: views.path().to_path_buf(),
        ..Default::default()
    };
    let renderer = |path: &str, locals: &Locals| -> Result<String> {
        let user = locals["user"].as_entity().map(|u| u.id_segment()).unwrap_or_default();
        Ok(format!("<{} {}>", path, user))
    };
    let transport = Arc::new(RecordingTransport::default());
    let sync =
        RenderSync::with_transport(&config, registry, Arc::new(renderer), transport.clone()).unwrap();

    Fixture {
        _views: views,
        users,
        transport,
        sync,
    }
}

fn signer() -> ChannelSigner {
    ChannelSigner::new(SECRET, Normalization::LeadingSlash)
}

fn paths(actions: &[render_sync::Action]) -> Vec<(SyncAction, String)> {
    actions.iter().map(|a| (a.kind, a.test_path())).collect()
}

// --- Lifecycle Scenarios ---

#[test]
fn test_group_membership_lifecycle() {
    let f = fixture();

    let created = f
        .sync
        .enable(None, |uow| {
            let user = Record::new(ModelName::new("user")).set("group", group(1));
            let transition = uow.on_before_create(&user)?;
            let user = f.users.insert(user);
            uow.on_after_commit(transition, &user)
        })
        .unwrap();
    assert_eq!(
        paths(&created),
        vec![
            (SyncAction::New, "/users/1".to_string()),
            (SyncAction::New, "/in_group/group/1/users/1".to_string()),
        ]
    );

    let user = f.users.get(render_sync::RecordId(1)).unwrap();
    let updated = f
        .sync
        .enable(None, |uow| {
            let moved = user.clone().set("group", group(2));
            let mut original = BTreeMap::new();
            original.insert("group".to_string(), Value::Entity(group(1)));
            let transition = uow.on_before_update(&moved, &original)?;
            f.users.save(&moved);
            uow.on_after_commit(transition, &moved)
        })
        .unwrap();
    assert_eq!(
        paths(&updated),
        vec![
            (SyncAction::Update, "/users/1".to_string()),
            (SyncAction::Destroy, "/in_group/group/1/users/1".to_string()),
            (SyncAction::New, "/in_group/group/2/users/1".to_string()),
        ]
    );

    let user = f.users.get(render_sync::RecordId(1)).unwrap();
    let destroyed = f
        .sync
        .enable(None, |uow| {
            let transition = uow.on_before_destroy(&user)?;
            f.users.delete(render_sync::RecordId(1));
            uow.on_after_commit(transition, &user)
        })
        .unwrap();
    assert_eq!(
        paths(&destroyed),
        vec![
            (SyncAction::Destroy, "/users/1".to_string()),
            (SyncAction::Destroy, "/in_group/group/2/users/1".to_string()),
        ]
    );

    // One batch per action, each carrying the single partial.
    let posts = f.transport.take();
    assert_eq!(posts.len(), 7);
    assert!(posts.iter().all(|post| post["channel"] == BATCH_CHANNEL));
    assert!(posts.iter().all(|post| post["data"].as_array().unwrap().len() == 1));
}

#[test]
fn test_published_channels_and_payloads() {
    let f = fixture();
    let signer = signer();

    f.sync
        .enable(None, |uow| {
            let user = Record::new(ModelName::new("user")).set("group", group(1));
            let transition = uow.on_before_create(&user)?;
            let user = f.users.insert(user);
            uow.on_after_commit(transition, &user)
        })
        .unwrap();

    let posts = f.transport.take();
    let root = &posts[0]["data"][0];
    assert_eq!(root["channel"], signer.channel("/users/new-_user_row-new"));
    assert_eq!(root["data"]["html"], "<sync/users/user_row 1>");
    assert_eq!(root["data"]["resourceId"], 1);
    assert_eq!(
        root["data"]["channelUpdate"],
        signer.channel("/users/1-_user_row-update")
    );
    assert_eq!(root["ext"]["auth_token"], SECRET);

    let scoped = &posts[1]["data"][0];
    assert_eq!(
        scoped["channel"],
        signer.channel("/in_group/group/1/users/new-_user_row-new")
    );
    assert_eq!(
        scoped["data"]["channelDestroy"],
        signer.channel("/in_group/group/1/users/1-_user_row-destroy")
    );
    // Updates are scope-free.
    assert_eq!(scoped["data"]["channelUpdate"], root["data"]["channelUpdate"]);
}

#[test]
fn test_rollback_publishes_nothing() {
    let f = fixture();

    f.sync
        .enable(None, |uow| -> Result<()> {
            let user = Record::new(ModelName::new("user")).set("group", group(1));
            let transition = uow.on_before_create(&user)?;
            uow.on_rollback(transition);

            let user = f.users.insert(user);
            let transition = uow.on_before_destroy(&user)?;
            assert_eq!(transition.queued().len(), 2);
            uow.on_rollback(transition);
            Ok(())
        })
        .unwrap();

    assert!(f.transport.take().is_empty());
}

#[test]
fn test_renderer_override_per_unit_of_work() {
    let f = fixture();
    let user = f.users.insert(Record::new(ModelName::new("user")));
    let other = |_: &str, _: &Locals| -> Result<String> { Ok("<mobile/>".to_string()) };
    let other: Arc<dyn Renderer> = Arc::new(other);

    f.sync
        .enable(Some(other), |uow| {
            let transition = uow.on_before_update(&user, &BTreeMap::new())?;
            uow.on_after_commit(transition, &user)
        })
        .unwrap();

    let posts = f.transport.take();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["data"][0]["data"]["html"], "<mobile/>");
}

#[test]
fn test_unregistered_model_is_rejected() {
    let f = fixture();
    let err = f
        .sync
        .enable(None, |uow| {
            uow.on_before_create(&Record::new(ModelName::new("project")))
        })
        .unwrap_err();
    assert!(matches!(err, render_sync::SyncError::UnknownModel(_)));
}

// --- Default Scopes and Touches ---

#[test]
fn test_default_scope_and_touch_propagation() {
    init_tracing();
    let views = TempDir::new().unwrap();
    for plural in ["todos", "projects", "users"] {
        fs::create_dir_all(views.path().join(plural)).unwrap();
        fs::write(views.path().join(plural).join("_row.html.erb"), "").unwrap();
    }

    let registry = Arc::new(ModelRegistry::new());
    registry.register(
        ModelType::new(ModelName::new("todo"))
            .attributes(&["project", "user", "title"])
            .sync(SyncActions::all())
            .default_scope("project")
            .sync_touch(&["user"]),
    );

    let config = SyncConfig {
        server: Some(SERVER.to_string()),
        auth_token: Some(SECRET.to_string()),
        adapter: Some(Adapter::Faye),
        views_root: views.path().to_path_buf(),
        ..Default::default()
    };
    let renderer = |path: &str, _: &Locals| -> Result<String> { Ok(path.to_string()) };
    let transport = Arc::new(RecordingTransport::default());
    let sync =
        RenderSync::with_transport(&config, registry, Arc::new(renderer), transport.clone()).unwrap();

    let project = EntityRef::new(ModelName::new("project"), 3);
    let todos = MemoryTable::new(ModelName::new("todo"));
    let actions = sync
        .enable(None, |uow| {
            let todo = Record::new(ModelName::new("todo"))
                .set("project", project.clone())
                .set("user", EntityRef::new(ModelName::new("user"), 5));
            let transition = uow.on_before_create(&todo)?;
            let todo = todos.insert(todo);
            uow.on_after_commit(transition, &todo)
        })
        .unwrap();

    assert_eq!(
        paths(&actions),
        vec![
            (SyncAction::New, "/projects/3/todos/1".to_string()),
            (SyncAction::Update, "/projects/3".to_string()),
            (SyncAction::Update, "/users/5".to_string()),
        ]
    );

    let signer = signer();
    let posts = transport.take();
    assert_eq!(
        posts[0]["data"][0]["channel"],
        signer.channel("/projects/3/todos/new-_row-new")
    );
    assert_eq!(
        posts[1]["data"][0]["channel"],
        signer.channel("/projects/3-_row-update")
    );
    assert_eq!(posts[2]["data"][0]["data"]["html"], "sync/users/row");
}
