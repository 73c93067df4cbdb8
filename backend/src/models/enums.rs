//! Closed vocabularies persisted as `TEXT` columns.
//!
//! Every enum here serializes (JSON and SQL) to the same upper-case token the
//! API exposes, e.g. `Priority::High` <-> `"HIGH"`.

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored or submitted token is not a known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

text_enum! {
    /// Workflow state of a task.
    pub enum TaskStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        InReview => "IN_REVIEW",
        Done => "DONE",
    }
}

text_enum! {
    pub enum Priority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

text_enum! {
    /// Role of a user inside a project.
    pub enum MemberRole {
        Owner => "OWNER",
        Admin => "ADMIN",
        Member => "MEMBER",
        Viewer => "VIEWER",
    }
}

text_enum! {
    pub enum NotificationType {
        TaskAssigned => "TASK_ASSIGNED",
        TaskUpdated => "TASK_UPDATED",
        TaskCompleted => "TASK_COMPLETED",
        CommentAdded => "COMMENT_ADDED",
        ProjectInvite => "PROJECT_INVITE",
        DueDateReminder => "DUE_DATE_REMINDER",
        Automation => "AUTOMATION",
    }
}

text_enum! {
    /// Domain event an automation listens for.
    pub enum TriggerType {
        TaskCreated => "TASK_CREATED",
        TaskUpdated => "TASK_UPDATED",
        TaskCompleted => "TASK_COMPLETED",
        TaskAssigned => "TASK_ASSIGNED",
        TaskMoved => "TASK_MOVED",
        StatusChanged => "STATUS_CHANGED",
        PriorityChanged => "PRIORITY_CHANGED",
        TaskDueSoon => "TASK_DUE_SOON",
        CommentAdded => "COMMENT_ADDED",
        ProjectCreated => "PROJECT_CREATED",
        WebhookReceived => "WEBHOOK_RECEIVED",
    }
}

text_enum! {
    /// Effect an automation performs when it fires.
    pub enum ActionType {
        AssignTask => "ASSIGN_TASK",
        SendNotification => "SEND_NOTIFICATION",
        MoveTask => "MOVE_TASK",
        CreateTask => "CREATE_TASK",
        UpdatePriority => "UPDATE_PRIORITY",
        SendEmail => "SEND_EMAIL",
    }
}

text_enum! {
    /// Outcome recorded on an automation log row.
    pub enum LogStatus {
        Success => "SUCCESS",
        Failed => "FAILED",
        Skipped => "SKIPPED",
    }
}

text_enum! {
    pub enum Visualization {
        Table => "table",
        Bar => "bar",
        Line => "line",
        Pie => "pie",
        Metric => "metric",
    }
}

impl MemberRole {
    /// Owners and admins may manage members, automations and integrations.
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }

    /// Viewers may read a project but not change it.
    pub fn can_write(&self) -> bool {
        !matches!(self, MemberRole::Viewer)
    }
}
