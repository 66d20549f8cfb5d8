//! Workflow item processing.
//!
//! A workflow item is a JSON object flowing through a host pipeline. Items
//! carrying only a user utterance get memory attached; items carrying the
//! utterance and the reply are saved. Every item leaves with its `sessionId`.

use serde_json::{Map, Value};

use crate::engine::{ConversationMemory, WriteBack};
use crate::engine::writeback::has_text;
use crate::session::SessionId;

/// Fields read as the user utterance, first match wins
pub const INPUT_FIELDS: [&str; 3] = ["input", "question", "message"];
/// Fields read as the assistant reply, first match wins
pub const REPLY_FIELDS: [&str; 3] = ["response", "output", "answer"];
pub const SESSION_FIELD: &str = "sessionId";

/// What an item asks of the memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    Load { utterance: String },
    Save { user: String, assistant: String },
    PassThrough,
}

/// First listed field holding a non-empty string
pub fn first_text<'a>(item: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|name| item.get(*name).and_then(Value::as_str))
        .find(|text| has_text(text))
}

/// Session key carried by the item itself
pub fn item_session(item: &Map<String, Value>) -> Option<&str> {
    item.get(SESSION_FIELD).and_then(Value::as_str)
}

pub fn classify(item: &Map<String, Value>) -> WorkflowAction {
    match (first_text(item, &INPUT_FIELDS), first_text(item, &REPLY_FIELDS)) {
        (Some(utterance), None) => WorkflowAction::Load {
            utterance: utterance.to_string(),
        },
        (Some(user), Some(assistant)) => WorkflowAction::Save {
            user: user.to_string(),
            assistant: assistant.to_string(),
        },
        _ => WorkflowAction::PassThrough,
    }
}

/// An item after processing, plus the pending remote appends of a save
pub struct ProcessedItem {
    pub item: Map<String, Value>,
    pub write_back: Option<WriteBack>,
}

/// Apply the item's action and annotate it.
///
/// A load adds `memory` (all variables) and one top-level field per
/// variable. A save adds `memorySaved: true`. `sessionId` is always set.
pub async fn process_item<M>(memory: &mut M, mut item: Map<String, Value>, session: &SessionId) -> ProcessedItem
where
    M: ConversationMemory + ?Sized,
{
    let mut write_back = None;

    match classify(&item) {
        WorkflowAction::Load { utterance } => {
            let variables = memory.load_context(&utterance, session).await;
            let as_json: Map<String, Value> = variables
                .iter()
                .map(|(key, text)| (key.clone(), Value::String(text.clone())))
                .collect();
            item.insert("memory".to_string(), Value::Object(as_json.clone()));
            item.extend(as_json);
        }
        WorkflowAction::Save { user, assistant } => {
            write_back = Some(memory.save_turn(&user, &assistant, session).await);
            item.insert("memorySaved".to_string(), Value::Bool(true));
        }
        WorkflowAction::PassThrough => {}
    }

    item.insert(SESSION_FIELD.to_string(), Value::String(session.to_string()));
    ProcessedItem { item, write_back }
}
