use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single entry of the task list. Tasks have no identity of their own, two tasks with the same
/// text are still different tasks and are told apart by their position in the list.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct Task(Arc<str>);

impl Task {
    /// Creates a task out of user input. Surrounding whitespace is dropped and blank input
    /// doesn't produce a task.
    pub fn parse(input: &str) -> Option<Task> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Task(trimmed.into()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode_task_list(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string(tasks)
}

/// Stored lists that can't be decoded are treated as if nothing was stored.
pub fn decode_task_list(value: &str) -> Option<Vec<Task>> {
    match serde_json::from_str::<Vec<Task>>(value) {
        Ok(tasks) => Some(tasks),
        Err(e) => {
            warn!("Stored task list is not a list of strings {e}");
            None
        }
    }
}

pub fn encode_flag(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// Only the literal `1` turns the flag on.
pub fn decode_flag(value: &str) -> bool {
    value == "1"
}

pub fn encode_timestamp(epoch_ms: i64) -> String {
    epoch_ms.to_string()
}

/// Zero and anything that isn't a number means there is no usable timestamp.
pub fn decode_timestamp(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|v| *v != 0)
}

#[cfg(test)]
mod tests {
    use super::{decode_flag, decode_task_list, decode_timestamp, encode_task_list, Task};

    #[test]
    fn test_task_parse_trims() {
        assert_eq!(Task::parse("  Walk dog  ").unwrap().as_str(), "Walk dog");
        assert_eq!(Task::parse("\t \n"), None);
        assert_eq!(Task::parse(""), None);
    }

    #[test]
    fn test_task_list_is_plain_json_array() {
        let tasks = vec![Task::parse("Buy milk").unwrap(), Task::parse("Buy milk").unwrap()];
        assert_eq!(
            encode_task_list(&tasks).unwrap(),
            r#"["Buy milk","Buy milk"]"#
        );
    }

    #[test]
    fn test_malformed_task_list_is_absent() {
        assert_eq!(decode_task_list("not json"), None);
        assert_eq!(decode_task_list(r#"{"a": 1}"#), None);
        assert_eq!(decode_task_list("[1, 2]"), None);
        assert_eq!(decode_task_list("null"), None);
        assert_eq!(decode_task_list("[]"), Some(vec![]));
    }

    #[test]
    fn test_flag_only_accepts_one() {
        assert!(decode_flag("1"));
        assert!(!decode_flag("0"));
        assert!(!decode_flag("true"));
        assert!(!decode_flag(""));
    }

    #[test]
    fn test_timestamp_decoding() {
        assert_eq!(decode_timestamp("1530662400000"), Some(1530662400000));
        assert_eq!(decode_timestamp("0"), None);
        assert_eq!(decode_timestamp("yesterday"), None);
        assert_eq!(decode_timestamp(""), None);
    }
}
