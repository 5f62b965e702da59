//! Versioned queue envelope.
//!
//! Wire shape, one JSON object per notification:
//!
//! ```json
//! {"version": 1, "type": "new_user", "data": {"id": 5, "username": "bob"},
//!  "channel_id": 1, "happened_at": "2024-05-01T12:00:00.123456Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, Notification, NotificationKind, User, UserId};
use crate::{Error, Result};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Queue message wrapping one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub data: EnvelopeData,
    pub channel_id: ChannelId,
    pub happened_at: DateTime<Utc>,
}

/// Type-specific payload. The variant is implied by [`Envelope::kind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeData {
    UsersConnected(UsersConnectedData),
    User(UserData),
    Empty(EmptyData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersConnectedData {
    pub usernames: Vec<String>,
    pub users: Vec<UserData>,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyData {}

impl Envelope {
    pub fn new(notification: &Notification, happened_at: DateTime<Utc>) -> Self {
        let data = match notification {
            Notification::NewUserJoined { user, .. } | Notification::UserLeft { user, .. } => {
                EnvelopeData::User(user.into())
            }
            Notification::UsersConnected { users, .. } => {
                EnvelopeData::UsersConnected(UsersConnectedData {
                    usernames: users.iter().map(|u| u.username.clone()).collect(),
                    users: users.iter().map(UserData::from).collect(),
                })
            }
            Notification::UsersAllLeft { .. } => EnvelopeData::Empty(EmptyData {}),
        };

        Self {
            version: ENVELOPE_VERSION,
            kind: notification.kind(),
            data,
            channel_id: notification.channel_id(),
            happened_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an envelope and check that its payload matches its type.
    pub fn from_json(raw: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(raw)?;

        let consistent = matches!(
            (envelope.kind, &envelope.data),
            (
                NotificationKind::NewUser | NotificationKind::UserLeft,
                EnvelopeData::User(_)
            ) | (NotificationKind::UsersConnected, EnvelopeData::UsersConnected(_))
                | (NotificationKind::UsersLeft, EnvelopeData::Empty(_))
        );
        if !consistent {
            return Err(Error::Other(format!(
                "envelope payload does not match type {}",
                envelope.kind
            )));
        }

        Ok(envelope)
    }

    /// Rebuild the notification this envelope was made from.
    pub fn into_notification(self) -> Notification {
        let channel_id = self.channel_id;
        match self.data {
            EnvelopeData::User(data) => {
                let user = User::new(data.id, data.username);
                if self.kind == NotificationKind::UserLeft {
                    Notification::UserLeft { channel_id, user }
                } else {
                    Notification::NewUserJoined { channel_id, user }
                }
            }
            EnvelopeData::UsersConnected(data) => Notification::UsersConnected {
                channel_id,
                users: data
                    .users
                    .into_iter()
                    .map(|u| User::new(u.id, u.username))
                    .collect(),
            },
            EnvelopeData::Empty(_) => Notification::UsersAllLeft { channel_id },
        }
    }
}
