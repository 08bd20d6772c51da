//! Runtime orchestration against a scripted driver.
//!
//! The driver answers requests immediately from a table of canned replies
//! keyed by endpoint name, so every test is a single synchronous pass.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::{
    collections::{HashMap, VecDeque},
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
};

use rider_app::{Driver, Input, Runtime, Snapshot};
use rider_client::{
    ClientConfig, ClientEvent, MemoryTokenStore, Notice, NoticeLevel, RealtimeState, RequestId,
    Screen, TokenStore, TokenStoreError, UnavailableTokenStore,
};
use rider_core::{env::test_utils::MockEnv, session::Phase};
use rider_proto::{Endpoint, OrderId, failure::check_response};
use serde_json::{Value, json};

#[derive(Default)]
struct Record {
    requests: Vec<(&'static str, Option<String>)>,
    realtime_opens: Vec<Duration>,
    realtime_closes: usize,
    screens: Vec<Screen>,
    notices: Vec<Notice>,
    renders: usize,
    stopped: bool,
}

#[derive(Default)]
struct ScriptedDriver {
    inputs: VecDeque<Input>,
    replies: HashMap<&'static str, (u16, Value)>,
    record: Arc<Mutex<Record>>,
}

impl ScriptedDriver {
    fn reply(mut self, endpoint: &'static str, status: u16, body: Value) -> Self {
        self.replies.insert(endpoint, (status, body));
        self
    }

    fn then(mut self, event: ClientEvent) -> Self {
        self.inputs.push_back(Input::Event(event));
        self
    }

    fn record(&self) -> Arc<Mutex<Record>> {
        Arc::clone(&self.record)
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;

    async fn next_input(&mut self) -> Result<Option<Input>, Self::Error> {
        Ok(self.inputs.pop_front())
    }

    fn execute(&mut self, id: RequestId, endpoint: Endpoint, token: Option<String>) {
        let name = endpoint.name();
        self.record.lock().unwrap().requests.push((name, token));
        if let Some((status, body)) = self.replies.get(name) {
            let result = check_response(*status, serde_json::to_vec(body).unwrap());
            self.inputs.push_front(Input::Event(ClientEvent::Response { id, result }));
        }
    }

    fn open_realtime(&mut self, delay: Duration, _generation: u64) {
        self.record.lock().unwrap().realtime_opens.push(delay);
    }

    fn close_realtime(&mut self) {
        self.record.lock().unwrap().realtime_closes += 1;
    }

    fn navigate(&mut self, screen: &Screen) {
        self.record.lock().unwrap().screens.push(screen.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.record.lock().unwrap().notices.push(notice.clone());
    }

    fn render(&mut self, _snapshot: &Snapshot) -> Result<(), Self::Error> {
        self.record.lock().unwrap().renders += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.record.lock().unwrap().stopped = true;
    }
}

fn broken_store() -> UnavailableTokenStore {
    UnavailableTokenStore::new(TokenStoreError::Io("disk gone".into()))
}

fn profile() -> Value {
    json!({
        "_id": "r1",
        "firstname": "Jo",
        "lastname": "Reyes",
        "email": "jo@example.com",
        "status": "available"
    })
}

fn order(id: &str) -> Value {
    json!({
        "_id": id,
        "orderId": format!("ORD-{id}"),
        "userId": "u1",
        "firstname": "Ana",
        "lastname": "Cruz",
        "address": "12 Mabini St",
        "paymentStatus": "paid",
        "statusDelivery": "ready to deliver",
        "statusHistory": [],
        "orderItems": [],
        "totalPrice": 100.0
    })
}

fn home_driver() -> ScriptedDriver {
    ScriptedDriver::default()
        .reply("orders.fetch", 200, json!([order("o1"), order("o2")]))
        .reply("inbox.fetch", 200, json!([]))
        .reply("profile.fetch", 200, profile())
}

fn runtime<S: TokenStore>(
    driver: ScriptedDriver,
    store: S,
) -> Runtime<ScriptedDriver, MockEnv, S> {
    Runtime::new(driver, MockEnv::at(1_700_000_000_000), ClientConfig::default(), store)
}

#[tokio::test]
async fn stored_token_lands_on_home_with_data() {
    let driver = home_driver();
    let record = driver.record();
    let runtime = runtime(driver, MemoryTokenStore::with_token("tok"));
    let snapshots = runtime.subscribe();

    runtime.run().await.unwrap();

    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.phase, Phase::Authenticated);
    assert_eq!(snapshot.screen, Screen::Home);
    assert_eq!(snapshot.orders.len(), 2);
    assert_eq!(snapshot.user.as_ref().map(|u| u.firstname.as_str()), Some("Jo"));
    assert_eq!(snapshot.realtime, RealtimeState::Connecting);

    let record = record.lock().unwrap();
    let names: Vec<_> = record.requests.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, ["orders.fetch", "inbox.fetch", "profile.fetch"]);
    assert!(record.requests.iter().all(|(_, token)| token.as_deref() == Some("tok")));
    assert_eq!(record.realtime_opens, [Duration::ZERO]);
    assert!(record.stopped);
    assert_eq!(record.realtime_closes, 1);
}

#[tokio::test]
async fn unreadable_store_falls_back_to_login() {
    let driver = ScriptedDriver::default();
    let record = driver.record();
    let runtime = runtime(driver, broken_store());
    let snapshots = runtime.subscribe();

    runtime.run().await.unwrap();

    assert_eq!(snapshots.borrow().phase, Phase::Anonymous);
    let record = record.lock().unwrap();
    assert!(record.requests.is_empty());
    assert!(record.realtime_opens.is_empty());
    assert_eq!(record.screens.last(), Some(&Screen::Login));
    assert!(record.stopped);
}

#[tokio::test]
async fn login_works_without_a_usable_store() {
    let driver = home_driver()
        .reply("auth.login", 200, json!({ "accessToken": "fresh" }))
        .then(ClientEvent::Login { email: "jo@example.com".into(), password: "pw".into() });
    let record = driver.record();
    let runtime = runtime(driver, broken_store());
    let snapshots = runtime.subscribe();

    runtime.run().await.unwrap();

    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.phase, Phase::Authenticated);
    assert_eq!(snapshot.orders.len(), 2);
    let record = record.lock().unwrap();
    assert_eq!(record.screens.last(), Some(&Screen::Home));
    assert_eq!(record.realtime_opens, [Duration::ZERO]);
}

#[test]
fn login_persists_token_and_logout_forgets_it() {
    let store = MemoryTokenStore::new();
    let driver = home_driver()
        .reply("auth.login", 200, json!({ "accessToken": "fresh", "message": "ok" }))
        .then(ClientEvent::Login { email: "jo@example.com".into(), password: "pw".into() });
    let mut runtime = runtime(driver, store.clone());

    runtime.restore_session().unwrap();
    while let Some(Input::Event(event)) = runtime.driver_mut().inputs.pop_front() {
        runtime.dispatch(event).unwrap();
    }
    assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
    assert_eq!(runtime.screen(), &Screen::Home);

    runtime.dispatch(ClientEvent::Logout).unwrap();
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(runtime.screen(), &Screen::Login);
    assert!(runtime.client().orders().is_empty());
}

#[tokio::test]
async fn refused_intent_becomes_notice_and_loop_continues() {
    let driver = home_driver()
        .then(ClientEvent::AdvanceOrder { order: OrderId::new("missing") })
        .then(ClientEvent::DeleteOrders(Vec::new()))
        .then(ClientEvent::RefreshOrders);
    let record = driver.record();
    let runtime = runtime(driver, MemoryTokenStore::with_token("tok"));
    let snapshots = runtime.subscribe();

    runtime.run().await.unwrap();

    let record = record.lock().unwrap();
    let errors: Vec<_> = record
        .notices
        .iter()
        .filter(|n| n.level == NoticeLevel::Error)
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(errors, ["unknown order missing", "select at least one item"]);

    // The refresh after the refusals still went out
    let fetches = record.requests.iter().filter(|(name, _)| *name == "orders.fetch").count();
    assert_eq!(fetches, 2);
    assert_eq!(snapshots.borrow().orders.len(), 2);
}

#[tokio::test]
async fn token_store_failures_never_stop_the_loop() {
    let driver = home_driver()
        .reply("auth.login", 200, json!({ "accessToken": "fresh" }))
        .then(ClientEvent::Login { email: "jo@example.com".into(), password: "pw".into() })
        .then(ClientEvent::Logout);
    let record = driver.record();
    let runtime = runtime(driver, broken_store());
    let snapshots = runtime.subscribe();

    runtime.run().await.unwrap();

    assert_eq!(snapshots.borrow().phase, Phase::Anonymous);
    let record = record.lock().unwrap();
    assert!(record.requests.iter().any(|(name, _)| *name == "auth.login"));
    assert!(record.stopped);
}

#[tokio::test]
async fn quit_input_ends_run_before_later_inputs() {
    let mut driver = ScriptedDriver::default();
    driver.inputs.push_back(Input::Quit);
    driver.inputs.push_back(Input::Event(ClientEvent::Login {
        email: "jo@example.com".into(),
        password: "pw".into(),
    }));
    let record = driver.record();

    runtime(driver, MemoryTokenStore::new()).run().await.unwrap();

    let record = record.lock().unwrap();
    assert!(record.requests.is_empty());
    assert!(record.stopped);
    assert!(record.renders >= 1);
}
