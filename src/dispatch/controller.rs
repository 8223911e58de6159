//! The two-phase dispatch state machine.
//!
//! Fresh envelopes get a fast acknowledgement and a background re-submission;
//! background-marked envelopes do the store work, wait the fixed delay and
//! deliver exactly one delayed reply. Every failure path resolves to some
//! user-readable string — nothing here returns an error to the platform.

use chrono::Local;
use serde_json::{json, Map};
use tokio::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::command::{self, Action, Command};
use crate::dispatch::envelope::{DispatchEnvelope, Reply};
use crate::dispatch::{DelayedReplier, SelfInvoker};
use crate::ledger::{self, AddOutcome};
use crate::report;
use crate::store::{RecordStore, SelectQuery, SortDirection, Table};

/// Fallback acknowledgement when the background re-submission cannot be
/// issued (taxonomy (a): the user sees this and no background job runs).
const SETUP_FAILED_TEXT: &str = "Could not setup timer :(";

/// Tuning for the dispatch controller.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Seconds to wait before delivering the delayed reply, respecting the
    /// chat platform's ordering expectations for out-of-band messages.
    pub delay_seconds: u64,
    /// Store record id of the user meals are attributed to. When empty the
    /// user link field is omitted from created records.
    pub user_record_id: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 2,
            user_record_id: String::new(),
        }
    }
}

/// How a dispatch terminated.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Fresh phase: send this reply on the synchronous path.
    Ack(Reply),
    /// Background phase: the delayed reply was already delivered; the
    /// synchronous reply path must stay silent.
    Suppressed,
}

/// Deferred dispatch controller, generic over its three boundaries so tests
/// can substitute in-memory fakes.
pub struct DispatchController<I, R, S> {
    invoker: I,
    replier: R,
    store: S,
    config: DispatchConfig,
}

impl<I, R, S> DispatchController<I, R, S>
where
    I: SelfInvoker,
    R: DelayedReplier,
    S: RecordStore,
{
    pub fn new(invoker: I, replier: R, store: S, config: DispatchConfig) -> Self {
        Self {
            invoker,
            replier,
            store,
            config,
        }
    }

    /// Run one envelope through exactly one phase, keyed on the marker.
    pub async fn dispatch(&self, envelope: DispatchEnvelope) -> DispatchOutcome {
        if envelope.background {
            self.run_background(envelope).await
        } else {
            self.run_fresh(envelope).await
        }
    }

    /// Phase one: classify, re-submit, acknowledge. No store calls; must
    /// finish well inside the platform's response window.
    async fn run_fresh(&self, envelope: DispatchEnvelope) -> DispatchOutcome {
        let command = command::parse(&envelope.command.text);
        debug!(action = ?command.action, "fresh dispatch");

        match command.action {
            // Help and unrecognised input are answered inline; neither needs
            // store access, so no background job is scheduled.
            Action::Help => DispatchOutcome::Ack(Reply::ephemeral(report::help_text())),
            Action::Unknown => DispatchOutcome::Ack(Reply::ephemeral(report::unknown_text())),
            _ => {
                let label = command.action.view_label();
                match self.invoker.invoke(envelope.into_background()).await {
                    Ok(()) => DispatchOutcome::Ack(Reply::in_channel(label)),
                    Err(e) => {
                        error!("background re-submission failed: {e}");
                        DispatchOutcome::Ack(Reply::ephemeral(SETUP_FAILED_TEXT))
                    }
                }
            }
        }
    }

    /// Phase two: parse again (parsing is pure, both phases see the same
    /// command), do the store work, wait, deliver once, suppress.
    async fn run_background(&self, envelope: DispatchEnvelope) -> DispatchOutcome {
        let command = command::parse(&envelope.command.text);
        info!(action = ?command.action, "background dispatch");

        let text = self.build_report(&command).await;

        tokio::time::sleep(Duration::from_secs(self.config.delay_seconds)).await;
        let reply = Reply::in_channel(text);
        if let Err(e) = self.replier.deliver(&envelope.command, reply).await {
            // Terminal either way: the job is never retried.
            error!("delayed reply delivery failed: {e}");
        }
        DispatchOutcome::Suppressed
    }

    /// Build the report text for one command. Store failures are logged and
    /// leave the text as accumulated so far (possibly empty) — the reply is
    /// delivered regardless.
    async fn build_report(&self, command: &Command) -> String {
        match command.action {
            Action::Add => self.handle_add(command).await,
            Action::Today => self.handle_today().await,
            Action::YesterdaySummary => self.handle_yesterday().await,
            Action::Delete => self.handle_delete(command).await,
            Action::Vitals => self.handle_vitals().await,
            // Help and Unknown never reach this phase; fall through to the
            // meals listing like any other already-acknowledged view.
            Action::Meals | Action::Help | Action::Unknown => self.handle_meals().await,
        }
    }

    async fn handle_add(&self, command: &Command) -> String {
        match ledger::apply(command, Local::now()) {
            AddOutcome::Rejected { token } => report::invalid_category(&token),
            AddOutcome::Applied {
                meal_name,
                date,
                totals,
            } => {
                let mut fields = Map::new();
                fields.insert("Meal".to_string(), json!(meal_name));
                fields.insert(
                    "Date".to_string(),
                    json!(date.format("%Y-%m-%d").to_string()),
                );
                fields.insert("Handler".to_string(), json!(new_handler_code()));
                if !self.config.user_record_id.is_empty() {
                    fields.insert("User".to_string(), json!([self.config.user_record_id]));
                }
                for (category, value) in totals.iter() {
                    fields.insert(ledger::capitalize(category), json!(value));
                }
                match self.store.create(Table::Meals, fields).await {
                    Ok(_) => report::added(&meal_name),
                    Err(e) => {
                        error!("meal create failed: {e}");
                        String::new()
                    }
                }
            }
        }
    }

    async fn handle_today(&self) -> String {
        let query = SelectQuery::default().view("Today");
        match self.store.select(Table::Meals, query).await {
            Ok(records) => report::totals_table(&ledger::aggregate(&records)),
            Err(e) => {
                error!("today select failed: {e}");
                String::new()
            }
        }
    }

    async fn handle_yesterday(&self) -> String {
        let query = SelectQuery::default()
            .view("Main View")
            .sort("Date", SortDirection::Desc)
            .max_records(1);
        match self.store.select(Table::Log, query).await {
            Ok(records) if records.is_empty() => report::no_records().to_string(),
            Ok(records) => report::totals_table(&ledger::aggregate(&records)),
            Err(e) => {
                error!("yesterday select failed: {e}");
                String::new()
            }
        }
    }

    async fn handle_delete(&self, command: &Command) -> String {
        let Some(code) = &command.handler_code else {
            return String::new();
        };
        let query = SelectQuery::default()
            .view("Today")
            .filter(format!("{{Handler}} = \"{code}\""));
        let records = match self.store.select(Table::Meals, query).await {
            Ok(records) => records,
            Err(e) => {
                error!("delete lookup failed: {e}");
                return String::new();
            }
        };
        let Some(record) = records.first() else {
            // Racing deletes or a stale code: swallowed, empty report.
            debug!(code = %code, "no record matched handler code");
            return String::new();
        };
        let meal_name = record.text("Meal").unwrap_or_default().to_string();
        match self.store.destroy(Table::Meals, record.id()).await {
            Ok(()) => report::deleted(&meal_name),
            Err(e) => {
                error!("meal destroy failed: {e}");
                String::new()
            }
        }
    }

    async fn handle_vitals(&self) -> String {
        let query = SelectQuery::default()
            .view("Main View")
            .sort("Date", SortDirection::Desc)
            .max_records(10);
        match self.store.select(Table::Vitals, query).await {
            Ok(records) => report::vitals_list(&records),
            Err(e) => {
                error!("vitals select failed: {e}");
                String::new()
            }
        }
    }

    async fn handle_meals(&self) -> String {
        let query = SelectQuery::default()
            .view("Today")
            .field("Handler")
            .field("Meal");
        match self.store.select(Table::Meals, query).await {
            Ok(records) => report::meals_list(&records),
            Err(e) => {
                error!("meals select failed: {e}");
                String::new()
            }
        }
    }
}

/// Generate the 4-character handler code attached to a new meal record.
fn new_handler_code() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_uppercase()
}
