//! Chat messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::chain::MessageChain;
use super::contact::{Client, Friend, Group, Member, Stranger};

tagged_union! {
    /// Every message family payload.
    pub enum MessageEvent in Message {
        GroupMessage,
        FriendMessage,
        TempMessage,
        StrangerMessage,
        OtherClientMessage,
        FriendSyncMessage,
        GroupSyncMessage,
        TempSyncMessage,
        StrangerSyncMessage,
    }
}

impl MessageEvent {
    /// Returns the message content.
    pub fn chain(&self) -> &MessageChain {
        match self {
            Self::GroupMessage(m) => &m.message_chain,
            Self::FriendMessage(m) => &m.message_chain,
            Self::TempMessage(m) => &m.message_chain,
            Self::StrangerMessage(m) => &m.message_chain,
            Self::OtherClientMessage(m) => &m.message_chain,
            Self::FriendSyncMessage(m) => &m.message_chain,
            Self::GroupSyncMessage(m) => &m.message_chain,
            Self::TempSyncMessage(m) => &m.message_chain,
            Self::StrangerSyncMessage(m) => &m.message_chain,
        }
    }

    /// Returns the sending account. Sync messages and messages from other
    /// clients have none.
    pub fn sender_id(&self) -> Option<i64> {
        match self {
            Self::GroupMessage(m) => Some(m.sender.id),
            Self::FriendMessage(m) => Some(m.sender.id),
            Self::TempMessage(m) => Some(m.sender.id),
            Self::StrangerMessage(m) => Some(m.sender.id),
            Self::OtherClientMessage(_)
            | Self::FriendSyncMessage(_)
            | Self::GroupSyncMessage(_)
            | Self::TempSyncMessage(_)
            | Self::StrangerSyncMessage(_) => None,
        }
    }

    /// Returns the message id from the chain's source element.
    pub fn message_id(&self) -> Option<i64> {
        self.chain().message_id()
    }
}

impl fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupMessage(m) => write!(
                f,
                "GroupMessage [{}({})] {}({}) => {}",
                m.sender.group.name, m.sender.group.id, m.sender.member_name, m.sender.id, m.message_chain
            ),
            Self::FriendMessage(m) => write!(
                f,
                "FriendMessage {}({}) => {}",
                m.sender.nickname, m.sender.id, m.message_chain
            ),
            Self::TempMessage(m) => write!(
                f,
                "TempMessage [{}] {}({}) => {}",
                m.sender.group.id, m.sender.member_name, m.sender.id, m.message_chain
            ),
            Self::StrangerMessage(m) => write!(
                f,
                "StrangerMessage {}({}) => {}",
                m.sender.nickname, m.sender.id, m.message_chain
            ),
            other => write!(f, "{} => {}", other.kind(), other.chain()),
        }
    }
}

/// A message in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    /// The member who sent it.
    pub sender: Member,
    /// Content.
    pub message_chain: MessageChain,
}

impl GroupMessage {
    /// Returns the group the message was sent in.
    pub fn group(&self) -> &Group {
        &self.sender.group
    }
}

/// A message from a friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendMessage {
    /// The friend who sent it.
    pub sender: Friend,
    /// Content.
    pub message_chain: MessageChain,
}

/// A private message from a group member who is not a friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempMessage {
    /// The member who sent it.
    pub sender: Member,
    /// Content.
    pub message_chain: MessageChain,
}

impl TempMessage {
    /// Returns the group the conversation goes through.
    pub fn group(&self) -> &Group {
        &self.sender.group
    }
}

/// A message from a stranger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrangerMessage {
    /// The stranger who sent it.
    pub sender: Stranger,
    /// Content.
    pub message_chain: MessageChain,
}

/// A message sent from another client of the bot's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherClientMessage {
    /// The client.
    pub sender: Client,
    /// Content.
    pub message_chain: MessageChain,
}

/// A friend message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSyncMessage {
    /// The receiving friend.
    pub subject: Friend,
    /// Content.
    pub message_chain: MessageChain,
}

/// A group message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSyncMessage {
    /// The receiving group.
    pub subject: Group,
    /// Content.
    pub message_chain: MessageChain,
}

/// A temp message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempSyncMessage {
    /// The receiving member.
    pub subject: Member,
    /// Content.
    pub message_chain: MessageChain,
}

/// A stranger message the bot's account sent from another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrangerSyncMessage {
    /// The receiving stranger.
    pub subject: Stranger,
    /// Content.
    pub message_chain: MessageChain,
}
