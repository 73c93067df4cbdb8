//! JSON frames exchanged over the `/notifications` WebSocket.
//!
//! Frames use `{"event": <name>, "data": <payload>}` envelopes.

use crate::models::{Notification, TriggerType};
use serde::{Deserialize, Serialize};

/// Frame sent by a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinProject { project_id: i32 },
    #[serde(rename_all = "camelCase")]
    LeaveProject { project_id: i32 },
    #[serde(rename_all = "camelCase")]
    MarkAsRead { notification_id: i32 },
}

/// Frame pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A single new notification.
    Notification(Notification),
    /// Unread backlog, sent once on connect.
    Notifications(Vec<Notification>),
    /// Something changed inside a project room.
    #[serde(rename_all = "camelCase")]
    ProjectActivity {
        project_id: i32,
        trigger: TriggerType,
        task_id: Option<i32>,
        actor_id: Option<i32>,
    },
    NotificationRead(Notification),
    Joined { room: String },
    Left { room: String },
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_project_frame() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"joinProject","data":{"projectId":4}}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinProject { project_id: 4 });
    }

    #[test]
    fn test_mark_as_read_frame() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"markAsRead","data":{"notificationId":9}}"#).unwrap();
        assert_eq!(msg, ClientMessage::MarkAsRead { notification_id: 9 });
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"event":"dropTables","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_frames_use_event_envelope() {
        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "nope");

        let json = serde_json::to_value(ServerEvent::Notifications(vec![])).unwrap();
        assert_eq!(json["event"], "notifications");
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_project_activity_frame() {
        let json = serde_json::to_value(ServerEvent::ProjectActivity {
            project_id: 1,
            trigger: TriggerType::TaskMoved,
            task_id: Some(2),
            actor_id: Some(3),
        })
        .unwrap();
        assert_eq!(json["event"], "projectActivity");
        assert_eq!(json["data"]["trigger"], "TASK_MOVED");
        assert_eq!(json["data"]["taskId"], 2);
    }
}
