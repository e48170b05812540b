//! Integration tests for broker batching and asynchronous delivery.

use parking_lot::Mutex;
use render_sync::{
    Client, Delivery, FayeClient, HttpTransport, Message, PusherApp, PusherClient, Reactor,
    Result, SyncError, BATCH_CHANNEL,
};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use std::thread;

#[derive(Default)]
struct Recorder {
    forms: Mutex<Vec<(String, Json)>>,
    bodies: Mutex<Vec<(String, Json)>>,
    threads: Mutex<Vec<Option<String>>>,
}

impl Recorder {
    fn note_thread(&self) {
        let name = thread::current().name().map(str::to_string);
        self.threads.lock().push(name);
    }
}

impl HttpTransport for Recorder {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<()> {
        self.note_thread();
        assert_eq!(form.len(), 1);
        assert_eq!(form[0].0, "message");
        let message = serde_json::from_str(form[0].1)?;
        self.forms.lock().push((url.to_string(), message));
        Ok(())
    }

    fn post_json(&self, url: &str, body: &str) -> Result<()> {
        self.note_thread();
        let body = serde_json::from_str(body)?;
        self.bodies.lock().push((url.to_string(), body));
        Ok(())
    }
}

fn messages(client: &Client, count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| client.build_message(format!("/channel-{}", i), json!({ "html": i })))
        .collect()
}

// --- Faye ---

#[test]
fn test_faye_batch_is_one_request() {
    let recorder = Arc::new(Recorder::default());
    let client = Client::Faye(FayeClient::new(
        "http://localhost:9292/faye",
        "secret",
        recorder.clone(),
        Delivery::Synchronous,
    ));

    client.batch_publish(&messages(&client, 5)).unwrap();

    let forms = recorder.forms.lock();
    assert_eq!(forms.len(), 1);
    let (url, envelope) = &forms[0];
    assert_eq!(url, "http://localhost:9292/faye");
    assert_eq!(envelope["channel"], BATCH_CHANNEL);
    assert_eq!(envelope["ext"]["auth_token"], "secret");

    let inner = envelope["data"].as_array().unwrap();
    assert_eq!(inner.len(), 5);
    for (i, message) in inner.iter().enumerate() {
        assert_eq!(message["channel"], format!("/channel-{}", i));
        assert_eq!(message["data"]["html"], i);
        assert_eq!(message["ext"]["auth_token"], "secret");
    }
}

#[test]
fn test_faye_single_publish_and_empty_batch() {
    let recorder = Arc::new(Recorder::default());
    let client = Client::Faye(FayeClient::new(
        "http://localhost:9292/faye",
        "secret",
        recorder.clone(),
        Delivery::Synchronous,
    ));

    client.batch_publish(&[]).unwrap();
    assert!(recorder.forms.lock().is_empty());

    let message = client.build_message("/abc", json!({ "html": "<p/>" }));
    client.publish(&message).unwrap();
    let forms = recorder.forms.lock();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].1["channel"], "/abc");
}

#[test]
fn test_faye_async_batch_runs_on_reactor() {
    let recorder = Arc::new(Recorder::default());
    let reactor = Arc::new(Reactor::named("batch-reactor"));
    let client = Client::Faye(FayeClient::new(
        "http://localhost:9292/faye",
        "secret",
        recorder.clone(),
        Delivery::Asynchronous(Arc::clone(&reactor)),
    ));

    for _ in 0..3 {
        client.batch_publish(&messages(&client, 4)).unwrap();
    }
    reactor.stop();

    let forms = recorder.forms.lock();
    assert_eq!(forms.len(), 3);
    assert!(forms
        .iter()
        .all(|(_, envelope)| envelope["data"].as_array().unwrap().len() == 4));
    assert!(recorder
        .threads
        .lock()
        .iter()
        .all(|name| name.as_deref() == Some("batch-reactor")));
    assert_eq!(reactor.starts(), 1);
}

#[test]
fn test_async_failure_does_not_reach_caller() {
    struct Down;

    impl HttpTransport for Down {
        fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<()> {
            Err(SyncError::Network("connection refused".into()))
        }

        fn post_json(&self, _url: &str, _body: &str) -> Result<()> {
            Err(SyncError::Network("connection refused".into()))
        }
    }

    let reactor = Arc::new(Reactor::new());
    let asynchronous = FayeClient::new(
        "http://localhost:9292/faye",
        "secret",
        Arc::new(Down),
        Delivery::Asynchronous(Arc::clone(&reactor)),
    );
    let message = asynchronous.build_message("/abc", json!({}));
    assert!(asynchronous.publish(&message).is_ok());
    reactor.stop();

    let synchronous =
        FayeClient::new("http://localhost:9292/faye", "secret", Arc::new(Down), Delivery::Synchronous);
    assert!(matches!(synchronous.publish(&message), Err(SyncError::Network(_))));
}

// --- Pusher ---

#[test]
fn test_pusher_batch_triggers_each_message() {
    let recorder = Arc::new(Recorder::default());
    let app = PusherApp::new("3", "key", "secret");
    let client = Client::Pusher(PusherClient::new(app, recorder.clone(), Delivery::Synchronous));

    client.batch_publish(&messages(&client, 3)).unwrap();

    let bodies = recorder.bodies.lock();
    assert_eq!(bodies.len(), 3);
    for (i, (url, body)) in bodies.iter().enumerate() {
        assert!(url.starts_with("http://api.pusherapp.com/apps/3/events?auth_key=key&"));
        assert!(url.contains("&auth_signature="));
        assert_eq!(body["name"], "sync");
        assert_eq!(body["channels"], json!([format!("/channel-{}", i)]));
        let data: Json = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data["html"], i);
    }
    assert!(recorder.forms.lock().is_empty());
}

// --- Null ---

#[test]
fn test_null_client_accepts_everything() {
    let client = Client::Null(render_sync::NullClient::new());
    let batch = messages(&client, 2);
    assert_eq!(batch[0].auth_token(), render_sync::DUMMY_AUTH_TOKEN);
    client.publish(&batch[0]).unwrap();
    client.batch_publish(&batch).unwrap();
}
