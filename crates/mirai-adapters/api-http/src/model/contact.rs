//! Contacts: the parties a message or event refers to.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::permission::Permission;

/// A group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group number.
    pub id: i64,
    /// Group name.
    pub name: String,
    /// The bot's permission in this group.
    pub permission: Permission,
}

/// A friend of the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    /// Account number.
    pub id: i64,
    /// Nickname.
    pub nickname: String,
    /// Remark set by the bot.
    pub remark: String,
}

/// An account that is neither a friend nor reached through a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stranger {
    /// Account number.
    pub id: i64,
    /// Nickname.
    pub nickname: String,
    /// Remark.
    #[serde(default)]
    pub remark: String,
}

/// A member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Account number.
    pub id: i64,
    /// Group card, falling back to the nickname.
    pub member_name: String,
    /// Special title granted by the owner.
    #[serde(default)]
    pub special_title: String,
    /// Permission in the group.
    pub permission: Permission,
    /// Join time as a unix timestamp.
    #[serde(default)]
    pub join_timestamp: i64,
    /// Last message time as a unix timestamp.
    #[serde(default)]
    pub last_speak_timestamp: i64,
    /// Seconds of mute left.
    #[serde(default)]
    pub mute_time_remaining: i64,
    /// The group this member belongs to.
    pub group: Group,
}

/// The member that performed an administrative action.
///
/// Same shape as [`Member`]; kept distinct so listeners can ask for the actor
/// and the subject of an event separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operator(pub Member);

impl Deref for Operator {
    type Target = Member;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Operator> for Member {
    fn from(operator: Operator) -> Self {
        operator.0
    }
}

/// Another client logged into the bot's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Client id.
    pub id: i64,
    /// Platform name, e.g. `"MOBILE"`.
    #[serde(default)]
    pub platform: String,
}

/// The kind of context a nudge happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    /// A friend chat.
    Friend,
    /// A group chat.
    Group,
    /// A stranger chat.
    Stranger,
}

impl SubjectKind {
    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::Group => "Group",
            Self::Stranger => "Stranger",
        }
    }
}

/// The context a nudge was sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Group number or account number, depending on `kind`.
    pub id: i64,
    /// Context kind.
    pub kind: SubjectKind,
}

/// The number a command addresses: an account or a group.
///
/// Commands accept either a raw number or the contact itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl From<i64> for ContactId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

macro_rules! contact_id_from {
    ($($contact:ty),*) => {
        $(
            impl From<&$contact> for ContactId {
                fn from(contact: &$contact) -> Self {
                    Self(contact.id)
                }
            }

            impl From<$contact> for ContactId {
                fn from(contact: $contact) -> Self {
                    Self(contact.id)
                }
            }
        )*
    };
}

contact_id_from!(Group, Friend, Stranger, Member, Client, Subject);

impl From<&Operator> for ContactId {
    fn from(operator: &Operator) -> Self {
        Self(operator.id)
    }
}
