//! Commands a caller submits to the mutation coordinator.
//!
//! A command is plain data, so it can be queued, logged or deserialized from
//! another process before it is executed.

use crate::{ActivityKind, UserId, UserPayload};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    /// Activity log vocabulary for this kind.
    pub fn activity_kind(self) -> ActivityKind {
        match self {
            MutationKind::Create => ActivityKind::Add,
            MutationKind::Update => ActivityKind::Edit,
            MutationKind::Delete => ActivityKind::Delete,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        })
    }
}

/// One mutation request: `{op, payload}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Create(UserPayload),
    Update { id: UserId, payload: UserPayload },
    Delete { id: UserId },
}

impl Command {
    pub fn kind(&self) -> MutationKind {
        match self {
            Command::Create(_) => MutationKind::Create,
            Command::Update { .. } => MutationKind::Update,
            Command::Delete { .. } => MutationKind::Delete,
        }
    }

    /// The record this command targets. Creates have none until they start.
    pub fn target(&self) -> Option<UserId> {
        match self {
            Command::Create(_) => None,
            Command::Update { id, .. } | Command::Delete { id } => Some(*id),
        }
    }

    pub fn payload(&self) -> Option<&UserPayload> {
        match self {
            Command::Create(payload) | Command::Update { payload, .. } => Some(payload),
            Command::Delete { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors() {
        let payload = UserPayload::new("A", "a@x.com", "1", "Co");

        let create = Command::Create(payload.clone());
        assert_eq!(create.kind(), MutationKind::Create);
        assert_eq!(create.target(), None);
        assert_eq!(create.payload(), Some(&payload));

        let update = Command::Update {
            id: 3,
            payload: payload.clone(),
        };
        assert_eq!(update.kind(), MutationKind::Update);
        assert_eq!(update.target(), Some(3));

        let delete = Command::Delete { id: 4 };
        assert_eq!(delete.target(), Some(4));
        assert_eq!(delete.payload(), None);
    }

    #[test]
    fn deserialize_tagged() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "update",
            "id": 1,
            "payload": {"name": "B", "email": "a@x.com", "phone": "555", "company": "Acme"}
        }))
        .unwrap();

        assert_eq!(
            cmd,
            Command::Update {
                id: 1,
                payload: UserPayload::new("B", "a@x.com", "555", "Acme"),
            }
        );

        let cmd: Command = serde_json::from_value(json!({"type": "delete", "id": 2})).unwrap();
        assert_eq!(cmd, Command::Delete { id: 2 });
    }

    #[test]
    fn activity_vocabulary() {
        assert_eq!(MutationKind::Create.activity_kind(), ActivityKind::Add);
        assert_eq!(MutationKind::Update.activity_kind(), ActivityKind::Edit);
        assert_eq!(MutationKind::Delete.activity_kind(), ActivityKind::Delete);
        assert_eq!(MutationKind::Update.to_string(), "update");
    }
}
