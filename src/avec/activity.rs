//! Assembly of decoded messages into an activity.

use std::{collections::BTreeMap, mem};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    options::OutputMode,
    sans::{header::FileHeader, record::DecodedMessage},
    value::{Fields, Value},
};

/// The messages of a decoded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedActivity {
    pub header: Option<FileHeader>,
    /// The latest message of each kind not collected into a list, such as
    /// `file_id`, `device_info` and `activity`, keyed by message name.
    pub messages: BTreeMap<String, Fields>,
    pub sessions: Vec<Fields>,
    pub laps: Vec<Fields>,
    pub records: Vec<Fields>,
    pub events: Vec<Fields>,
    /// The nested activity tree, built in cascade output modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

impl ParsedActivity {
    /// The latest message of a kind not collected into a list.
    pub fn message(&self, kind: &str) -> Option<&Fields> {
        self.messages.get(kind)
    }
}

/// An activity, owning its sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Activity {
    /// Fields of the `activity` message, empty if the document has none.
    #[serde(flatten)]
    pub fields: Fields,
    pub sessions: Vec<Session>,
    pub events: Vec<Fields>,
}

/// A session, owning the laps that closed before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub fields: Fields,
    pub laps: Vec<Lap>,
}

/// A lap, owning the records captured before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lap {
    #[serde(flatten)]
    pub fields: Fields,
    pub records: Vec<Fields>,
}

/// Items waiting for the boundary message that will own them.
#[derive(Debug)]
struct Grouping<T> {
    pending: Vec<T>,
}

impl<T> Default for Grouping<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Grouping<T> {
    fn push(&mut self, item: T) {
        self.pending.push(item);
    }

    /// Take every pending item, leaving the grouping empty.
    fn close(&mut self) -> Vec<T> {
        mem::take(&mut self.pending)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Routes decoded messages into flat lists and the activity tree.
#[derive(Debug)]
pub(crate) struct Assembly {
    mode: OutputMode,
    output: ParsedActivity,
    events: Vec<Fields>,
    sessions: Vec<Session>,
    laps: Grouping<Lap>,
    records: Grouping<Fields>,
    first_record: Option<DateTime<Utc>>,
}

impl Assembly {
    pub(crate) fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            output: ParsedActivity::default(),
            events: Vec::new(),
            sessions: Vec::new(),
            laps: Grouping::default(),
            records: Grouping::default(),
            first_record: None,
        }
    }

    /// Timestamp of the first `record` message, once seen.
    pub(crate) fn first_record(&self) -> Option<DateTime<Utc>> {
        self.first_record
    }

    pub(crate) fn push(&mut self, message: DecodedMessage<'_>) {
        let DecodedMessage {
            kind,
            global_message,
            mut fields,
            ..
        } = message;

        match kind {
            Some("record") => {
                // Records before the first timestamp all count as the start.
                if self.first_record.is_none() {
                    self.first_record = fields.get("timestamp").and_then(Value::as_timestamp);
                    fields.insert("elapsed_time".to_owned(), Value::Float(0.0));
                }

                let (flat, tree) = self.fan_out(fields);
                self.output.records.extend(flat);
                if let Some(fields) = tree {
                    self.records.push(fields);
                }
            }
            Some("lap") => {
                let (flat, tree) = self.fan_out(fields);
                self.output.laps.extend(flat);
                if let Some(fields) = tree {
                    let records = self.records.close();
                    self.laps.push(Lap { fields, records });
                }
            }
            Some("session") => {
                let (flat, tree) = self.fan_out(fields);
                self.output.sessions.extend(flat);
                if let Some(fields) = tree {
                    let laps = self.laps.close();
                    self.sessions.push(Session { fields, laps });
                }
            }
            Some("event") => self.events.push(fields),
            Some(kind) => {
                self.output.messages.insert(kind.to_owned(), fields);
            }
            None => trace!(global_message, "dropping unnamed message"),
        }
    }

    /// Split a message between the flat lists and the tree, as the output
    /// mode requires.
    fn fan_out(&self, fields: Fields) -> (Option<Fields>, Option<Fields>) {
        match (self.mode.wants_list(), self.mode.wants_cascade()) {
            (true, true) => (Some(fields.clone()), Some(fields)),
            (true, false) => (Some(fields), None),
            (false, _) => (None, Some(fields)),
        }
    }

    pub(crate) fn finish(mut self, header: Option<FileHeader>) -> ParsedActivity {
        self.output.header = header;

        if self.mode.wants_cascade() {
            if !self.records.is_empty() || !self.laps.is_empty() {
                warn!(
                    records = self.records.len(),
                    laps = self.laps.len(),
                    "dropping items not closed by a lap or session"
                );
            }

            let events = if self.mode.wants_list() {
                self.events.clone()
            } else {
                mem::take(&mut self.events)
            };

            self.output.activity = Some(Activity {
                fields: self.output.messages.get("activity").cloned().unwrap_or_default(),
                sessions: self.sessions,
                events,
            });
        }

        if self.mode.wants_list() {
            self.output.events = self.events;
        }

        debug!(
            records = self.output.records.len(),
            laps = self.output.laps.len(),
            sessions = self.output.sessions.len(),
            events = self.output.events.len(),
            messages = self.output.messages.len(),
            "assembled activity"
        );

        self.output
    }
}
