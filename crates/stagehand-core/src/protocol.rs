//! Wire protocol between the mirror and the version-control engine.
//!
//! Both directions are JSON objects tagged by `type`, one per line on the
//! bridge. List payloads stay encoded ([`Batch`]) until the mirror applies
//! them.

use serde::{Deserialize, Serialize};

use crate::record::{decode_batch, encode_batch, DecodeError};

/// Prefix of the engine error sent when the directory has no repository.
pub const NO_REPOSITORY_PREFIX: &str = "No VCS Directory Found";
/// Prefix of the engine error sent when a branch name is taken.
pub const BRANCH_EXISTS_PREFIX: &str = "Branch with that name already exists";

/// An encoded list of records, as carried by list notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Batch(pub String);

impl Batch {
    pub fn from_records<S: AsRef<str>>(records: &[S]) -> Self {
        Batch(encode_batch(records))
    }

    pub fn decode(&self) -> Result<Vec<String>, DecodeError> {
        decode_batch(&self.0)
    }
}

/// Engine → mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    BranchesUpdated { batch: Batch },
    StagedUpdated { batch: Batch },
    UnstagedUpdated { batch: Batch },
    TasksUpdated { batch: Batch },
    LogUpdated { batch: Batch },
    DirectoryUpdated {
        #[serde(default)]
        repo_name: Option<String>,
        #[serde(default)]
        repo_path: String,
    },
    Error { message: String },
    Info { message: String },
}

impl Notification {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::BranchesUpdated { .. } => "branches_updated",
            Notification::StagedUpdated { .. } => "staged_updated",
            Notification::UnstagedUpdated { .. } => "unstaged_updated",
            Notification::TasksUpdated { .. } => "tasks_updated",
            Notification::LogUpdated { .. } => "log_updated",
            Notification::DirectoryUpdated { .. } => "directory_updated",
            Notification::Error { .. } => "error",
            Notification::Info { .. } => "info",
        }
    }
}

/// Mirror → engine. Fire-and-forget: the engine answers, if at all, with a
/// later [`Notification`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    SelectFolder,
    RequestStatusRefresh,
    SetWorkingDirectory { path: String },
    StageFile { path: String },
    UnstageFile { path: String },
    CheckoutBranch { name: String },
    /// Without a name the engine is expected to ask for one.
    CreateBranch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    InitRepository { path: String },
    Commit {
        message: String,
        author: String,
        completed_tasks: Vec<String>,
        added_tasks: Vec<String>,
    },
    ResetToCommit { hash: String },
    RequestLog,
}

/// How an engine error message should be surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The selected directory has no repository; offer to initialize one.
    NoRepository,
    /// A branch with the requested name already exists.
    BranchExists,
    Other(String),
}

/// Classify an engine error message by its known prefixes.
pub fn classify_error(message: &str) -> EngineError {
    if message.starts_with(NO_REPOSITORY_PREFIX) {
        EngineError::NoRepository
    } else if message.starts_with(BRANCH_EXISTS_PREFIX) {
        EngineError::BranchExists
    } else {
        EngineError::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_wire_shape() {
        let n: Notification =
            serde_json::from_str(r#"{"type":"staged_updated","batch":"5:a.txt"}"#).unwrap();
        assert_eq!(
            n,
            Notification::StagedUpdated {
                batch: Batch("5:a.txt".into())
            }
        );
        assert_eq!(n.kind(), "staged_updated");
    }

    #[test]
    fn directory_notification_tolerates_missing_name() {
        let n: Notification =
            serde_json::from_str(r#"{"type":"directory_updated","repo_path":"/tmp/x"}"#).unwrap();
        assert_eq!(
            n,
            Notification::DirectoryUpdated {
                repo_name: None,
                repo_path: "/tmp/x".into()
            }
        );
    }

    #[test]
    fn request_wire_shape() {
        let json = serde_json::to_value(Request::Commit {
            message: "msg".into(),
            author: "user".into(),
            completed_tasks: vec!["a".into()],
            added_tasks: vec![],
        })
        .unwrap();
        assert_eq!(json["type"], "commit");
        assert_eq!(json["completed_tasks"][0], "a");

        let json = serde_json::to_string(&Request::CreateBranch { name: None }).unwrap();
        assert_eq!(json, r#"{"type":"create_branch"}"#);
        let json = serde_json::to_string(&Request::RequestLog).unwrap();
        assert_eq!(json, r#"{"type":"request_log"}"#);
    }

    #[test]
    fn batch_round_trips_through_records() {
        let batch = Batch::from_records(&["main", "dev"]);
        assert_eq!(batch.decode().unwrap(), vec!["main", "dev"]);
    }

    #[test]
    fn classify_known_prefixes() {
        assert_eq!(
            classify_error("No VCS Directory Found in /tmp/x"),
            EngineError::NoRepository
        );
        assert_eq!(
            classify_error("Branch with that name already exists: dev"),
            EngineError::BranchExists
        );
        assert_eq!(
            classify_error("disk full"),
            EngineError::Other("disk full".into())
        );
    }
}
