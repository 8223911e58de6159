// Integration tests for the two-phase dispatch state machine, with in-memory
// fakes standing in for the re-invocation, delayed-reply and store boundaries.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use pesas::dispatch::{
    DelayedReplier, DispatchConfig, DispatchController, DispatchEnvelope, DispatchOutcome, Reply,
    SelfInvoker, SlackCommand,
};
use pesas::errors::{DispatchError, StoreError};
use pesas::store::{Record, RecordStore, SelectQuery, Table};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct RecordingInvoker {
    fail: bool,
    submitted: Arc<Mutex<Vec<DispatchEnvelope>>>,
}

#[async_trait]
impl SelfInvoker for RecordingInvoker {
    async fn invoke(&self, envelope: DispatchEnvelope) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::QueueClosed);
        }
        self.submitted.lock().unwrap().push(envelope);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingReplier {
    delivered: Arc<Mutex<Vec<(String, Reply)>>>,
}

#[async_trait]
impl DelayedReplier for RecordingReplier {
    async fn deliver(&self, command: &SlackCommand, reply: Reply) -> Result<(), DispatchError> {
        self.delivered
            .lock()
            .unwrap()
            .push((command.response_url.clone(), reply));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeStore {
    fail: bool,
    select_result: Vec<Record>,
    selects: Arc<Mutex<Vec<(Table, SelectQuery)>>>,
    creates: Arc<Mutex<Vec<(Table, Map<String, Value>)>>>,
    destroys: Arc<Mutex<Vec<(Table, String)>>>,
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<Record>, StoreError> {
        self.selects.lock().unwrap().push((table, query));
        if self.fail {
            return Err(StoreError::Http("connection refused".into()));
        }
        Ok(self.select_result.clone())
    }

    async fn create(&self, table: Table, fields: Map<String, Value>) -> Result<Record, StoreError> {
        self.creates.lock().unwrap().push((table, fields.clone()));
        if self.fail {
            return Err(StoreError::Http("connection refused".into()));
        }
        Ok(Record {
            id: "recNew".into(),
            fields,
        })
    }

    async fn destroy(&self, table: Table, id: &str) -> Result<(), StoreError> {
        self.destroys.lock().unwrap().push((table, id.to_string()));
        if self.fail {
            return Err(StoreError::Http("connection refused".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn controller(
    invoker: RecordingInvoker,
    replier: RecordingReplier,
    store: FakeStore,
) -> DispatchController<RecordingInvoker, RecordingReplier, FakeStore> {
    DispatchController::new(
        invoker,
        replier,
        store,
        DispatchConfig {
            delay_seconds: 0,
            user_record_id: "recUser1".into(),
        },
    )
}

fn slash(text: &str) -> DispatchEnvelope {
    DispatchEnvelope::fresh(SlackCommand {
        text: text.to_string(),
        response_url: "https://hooks.slack.test/resp".to_string(),
        ..SlackCommand::default()
    })
}

fn record(id: &str, fields: Value) -> Record {
    serde_json::from_value(json!({"id": id, "fields": fields})).unwrap()
}

// ---------------------------------------------------------------------------
// Fresh phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_envelope_acks_with_view_label_and_submits_background_copy() {
    let invoker = RecordingInvoker::default();
    let store = FakeStore::default();
    let ctl = controller(invoker.clone(), RecordingReplier::default(), store.clone());

    let outcome = ctl.dispatch(slash("today")).await;
    assert_eq!(outcome, DispatchOutcome::Ack(Reply::in_channel("Today")));

    let submitted = invoker.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].background);
    assert_eq!(submitted[0].command.text, "today");

    // Fresh phase never touches the store.
    assert!(store.selects.lock().unwrap().is_empty());
    assert!(store.creates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fresh_aliases_ack_their_canonical_labels() {
    for (text, label) in [("rm AB12", "Delete"), ("last", "Yesterday summary")] {
        let invoker = RecordingInvoker::default();
        let ctl = controller(invoker.clone(), RecordingReplier::default(), FakeStore::default());
        let outcome = ctl.dispatch(slash(text)).await;
        assert_eq!(outcome, DispatchOutcome::Ack(Reply::in_channel(label)));
    }
}

#[tokio::test]
async fn fresh_help_is_answered_inline_without_a_background_job() {
    let invoker = RecordingInvoker::default();
    let ctl = controller(invoker.clone(), RecordingReplier::default(), FakeStore::default());

    let outcome = ctl.dispatch(slash("help")).await;
    match outcome {
        DispatchOutcome::Ack(reply) => {
            assert!(reply.text.contains("Valid commands"));
            assert!(!reply.in_channel);
        }
        other => panic!("expected Ack, got {other:?}"),
    }
    assert!(invoker.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fresh_unknown_command_gets_the_fixed_miss_reply() {
    let invoker = RecordingInvoker::default();
    let ctl = controller(invoker.clone(), RecordingReplier::default(), FakeStore::default());

    let outcome = ctl.dispatch(slash("breakfast please")).await;
    match outcome {
        DispatchOutcome::Ack(reply) => assert!(reply.text.starts_with("Wow, I missed that")),
        other => panic!("expected Ack, got {other:?}"),
    }
    assert!(invoker.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fresh_submit_failure_resolves_to_the_fallback_ack() {
    let invoker = RecordingInvoker {
        fail: true,
        ..RecordingInvoker::default()
    };
    let ctl = controller(invoker, RecordingReplier::default(), FakeStore::default());

    let outcome = ctl.dispatch(slash("today")).await;
    match outcome {
        DispatchOutcome::Ack(reply) => assert_eq!(reply.text, "Could not setup timer :("),
        other => panic!("expected Ack, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Background phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_today_aggregates_and_delivers_exactly_once() {
    let replier = RecordingReplier::default();
    let store = FakeStore {
        select_result: vec![
            record("rec1", json!({"Sugar": 3, "Flour": 5})),
            record("rec2", json!({"Sugar": 2, "Coffee": 1})),
        ],
        ..FakeStore::default()
    };
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    let outcome = ctl.dispatch(slash("today").into_background()).await;
    assert_eq!(outcome, DispatchOutcome::Suppressed);

    let selects = store.selects.lock().unwrap();
    assert_eq!(selects.len(), 1);
    assert_eq!(selects[0].0, Table::Meals);
    assert_eq!(selects[0].1.view.as_deref(), Some("Today"));

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "https://hooks.slack.test/resp");
    let text = &delivered[0].1.text;
    assert!(text.contains("Sugar 5\n"));
    assert!(text.contains("Flour 5\n"));
    assert!(text.contains("Coffee 1\n"));
    assert!(text.contains("Vegetables 0\n"));
    assert!(delivered[0].1.in_channel);
}

#[tokio::test]
async fn background_yesterday_with_no_records_delivers_the_literal_message() {
    let replier = RecordingReplier::default();
    let store = FakeStore::default();
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("yesterday").into_background()).await;

    let selects = store.selects.lock().unwrap();
    assert_eq!(selects[0].0, Table::Log);
    assert_eq!(selects[0].1.max_records, Some(1));

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(
        delivered[0].1.text,
        "There are not records yet!. Eat healthy my friend!"
    );
}

#[tokio::test]
async fn background_add_creates_a_full_meal_record() {
    let replier = RecordingReplier::default();
    let store = FakeStore::default();
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("add \"Oatmeal\", sugar 3, flour 5").into_background())
        .await;

    let creates = store.creates.lock().unwrap();
    assert_eq!(creates.len(), 1);
    let (table, fields) = &creates[0];
    assert_eq!(*table, Table::Meals);
    assert_eq!(fields["Meal"], json!("Oatmeal"));
    assert_eq!(fields["Sugar"], json!(3.0));
    assert_eq!(fields["Flour"], json!(5.0));
    assert_eq!(fields["Vegetables"], json!(0.0));
    assert_eq!(fields["User"], json!(["recUser1"]));
    assert_eq!(fields["Handler"].as_str().unwrap().len(), 4);
    assert!(fields["Date"].as_str().unwrap().len() == 10);

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered[0].1.text, "Added \"Oatmeal\" to PSAS Meals.");
}

#[tokio::test]
async fn background_add_with_bad_category_rejects_the_whole_add() {
    let replier = RecordingReplier::default();
    let store = FakeStore::default();
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("add \"X\", cookies 2").into_background())
        .await;

    // Nothing was persisted.
    assert!(store.creates.lock().unwrap().is_empty());

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(
        delivered[0].1.text,
        "\"cookies\" is not a valid category. Nothing was posted."
    );
}

#[tokio::test]
async fn background_delete_destroys_the_matching_record() {
    let replier = RecordingReplier::default();
    let store = FakeStore {
        select_result: vec![record("rec1", json!({"Handler": "AB12", "Meal": "Pasta"}))],
        ..FakeStore::default()
    };
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("delete ab12").into_background()).await;

    let selects = store.selects.lock().unwrap();
    assert_eq!(
        selects[0].1.filter_by_formula.as_deref(),
        Some("{Handler} = \"AB12\"")
    );
    let destroys = store.destroys.lock().unwrap();
    assert_eq!(*destroys, vec![(Table::Meals, "rec1".to_string())]);

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered[0].1.text, "Record \"Pasta\" was Deleted.");
}

#[tokio::test]
async fn background_delete_with_no_match_still_delivers_an_empty_report() {
    let replier = RecordingReplier::default();
    let store = FakeStore::default();
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    let outcome = ctl.dispatch(slash("delete ZZZZ").into_background()).await;
    assert_eq!(outcome, DispatchOutcome::Suppressed);

    assert!(store.destroys.lock().unwrap().is_empty());
    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].1.text, "");
}

#[tokio::test]
async fn background_vitals_renders_recent_records() {
    let replier = RecordingReplier::default();
    let store = FakeStore {
        select_result: vec![
            record("rec1", json!({"Date": "2026-03-05", "Weight": 80.5, "Fat": 21})),
            record("rec2", json!({"Date": "2026-02-28", "Weight": 81, "Fat": 22})),
        ],
        ..FakeStore::default()
    };
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("vitals").into_background()).await;

    let selects = store.selects.lock().unwrap();
    assert_eq!(selects[0].0, Table::Vitals);
    assert_eq!(selects[0].1.max_records, Some(10));

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(
        delivered[0].1.text,
        "• `3/5` => 80.5/21\n• `2/28` => 81/22\n"
    );
}

#[tokio::test]
async fn background_meals_lists_handler_and_name() {
    let replier = RecordingReplier::default();
    let store = FakeStore {
        select_result: vec![record("rec1", json!({"Handler": "AB12", "Meal": "Pasta"}))],
        ..FakeStore::default()
    };
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    ctl.dispatch(slash("meals").into_background()).await;

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered[0].1.text, "• AB12 Pasta\n");
}

#[tokio::test]
async fn background_store_failure_still_delivers_the_partial_report() {
    let replier = RecordingReplier::default();
    let store = FakeStore {
        fail: true,
        ..FakeStore::default()
    };
    let ctl = controller(RecordingInvoker::default(), replier.clone(), store.clone());

    let outcome = ctl.dispatch(slash("today").into_background()).await;
    assert_eq!(outcome, DispatchOutcome::Suppressed);

    let delivered = replier.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].1.text, "");
}
