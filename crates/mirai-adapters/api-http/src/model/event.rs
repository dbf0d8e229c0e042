//! Non-message notifications: bot lifecycle, friend and group changes, and
//! requests that need an answer.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::chain::MessageChain;
use super::contact::{Client, Friend, Group, Member, Operator, Subject};
use super::permission::Permission;

tagged_union! {
    /// Every event family payload.
    pub enum Event in Event {
        BotOnlineEvent,
        BotOfflineEventActive,
        BotOfflineEventForce,
        BotOfflineEventDropped,
        BotReloginEvent,
        FriendInputStatusChangedEvent,
        FriendNickChangedEvent,
        FriendAddEvent,
        FriendDeleteEvent,
        BotGroupPermissionChangeEvent,
        BotMuteEvent,
        BotUnmuteEvent,
        BotJoinGroupEvent,
        BotLeaveEventActive,
        BotLeaveEventKick,
        BotLeaveEventDisband,
        GroupRecallEvent,
        FriendRecallEvent,
        NudgeEvent,
        GroupNameChangeEvent,
        GroupEntranceAnnouncementChangeEvent,
        GroupMuteAllEvent,
        GroupAllowAnonymousChatEvent,
        GroupAllowConfessTalkEvent,
        GroupAllowMemberInviteEvent,
        MemberJoinEvent,
        MemberLeaveEventKick,
        MemberLeaveEventQuit,
        MemberCardChangeEvent,
        MemberSpecialTitleChangeEvent,
        MemberPermissionChangeEvent,
        MemberMuteEvent,
        MemberUnmuteEvent,
        MemberHonorChangeEvent,
        NewFriendRequestEvent,
        MemberJoinRequestEvent,
        BotInvitedJoinGroupRequestEvent,
        OtherClientOnlineEvent,
        OtherClientOfflineEvent,
        CommandExecutedEvent,
    }
}

impl Event {
    /// Returns the account that initiated the event, when the payload names
    /// one: `qq` for bot lifecycle events, `fromId` for nudges and requests.
    pub fn origin_id(&self) -> Option<i64> {
        match self {
            Self::BotOnlineEvent(e) => Some(e.qq),
            Self::BotOfflineEventActive(e) => Some(e.qq),
            Self::BotOfflineEventForce(e) => Some(e.qq),
            Self::BotOfflineEventDropped(e) => Some(e.qq),
            Self::BotReloginEvent(e) => Some(e.qq),
            Self::NudgeEvent(e) => Some(e.from_id),
            Self::NewFriendRequestEvent(e) => Some(e.from_id),
            Self::MemberJoinRequestEvent(e) => Some(e.from_id),
            Self::BotInvitedJoinGroupRequestEvent(e) => Some(e.from_id),
            _ => None,
        }
    }

    /// Returns `Some(true)` for events that bring the bot online and
    /// `Some(false)` for those that take it offline.
    pub fn online_transition(&self) -> Option<bool> {
        match self {
            Self::BotOnlineEvent(_) | Self::BotReloginEvent(_) => Some(true),
            Self::BotOfflineEventActive(_)
            | Self::BotOfflineEventForce(_)
            | Self::BotOfflineEventDropped(_) => Some(false),
            _ => None,
        }
    }
}

// =============================================================================
// Bot lifecycle
// =============================================================================

macro_rules! bot_lifecycle_events {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $name {
                /// The bot's account.
                pub qq: i64,
            }
        )*
    };
}

bot_lifecycle_events! {
    /// The bot logged in.
    BotOnlineEvent,
    /// The bot logged out on its own.
    BotOfflineEventActive,
    /// The bot was pushed offline by another login.
    BotOfflineEventForce,
    /// The bot lost its connection to the platform.
    BotOfflineEventDropped,
    /// The bot logged in again.
    BotReloginEvent,
}

// =============================================================================
// Friends
// =============================================================================

/// A friend started or stopped typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendInputStatusChangedEvent {
    /// The friend.
    pub friend: Friend,
    /// Whether the friend is typing now.
    pub inputting: bool,
}

/// A friend changed their nickname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendNickChangedEvent {
    /// The friend.
    pub friend: Friend,
    /// Old nickname.
    pub from: String,
    /// New nickname.
    pub to: String,
}

/// A friend was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendAddEvent {
    /// The new friend.
    pub friend: Friend,
    /// Whether the friend was a stranger before.
    #[serde(default)]
    pub stranger: bool,
}

/// A friend was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendDeleteEvent {
    /// The removed friend.
    pub friend: Friend,
}

/// A friend recalled a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecallEvent {
    /// Author of the recalled message.
    pub author_id: i64,
    /// Id of the recalled message.
    pub message_id: i64,
    /// Send time of the recalled message.
    pub time: i64,
    /// Account that recalled it.
    pub operator: i64,
}

/// Someone nudged someone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeEvent {
    /// Account that sent the nudge.
    pub from_id: i64,
    /// Where the nudge happened.
    pub subject: Subject,
    /// Action text, e.g. "poked".
    #[serde(default)]
    pub action: String,
    /// Suffix text.
    #[serde(default)]
    pub suffix: String,
    /// Account that was nudged.
    pub target: i64,
}

// =============================================================================
// The bot in groups
// =============================================================================

/// The bot's permission in a group changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotGroupPermissionChangeEvent {
    /// Previous permission.
    pub origin: Permission,
    /// New permission.
    pub current: Permission,
    /// The group.
    pub group: Group,
}

/// The bot was muted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMuteEvent {
    /// Mute duration.
    pub duration_seconds: i64,
    /// Who muted the bot.
    pub operator: Operator,
}

/// The bot was unmuted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotUnmuteEvent {
    /// Who unmuted the bot.
    pub operator: Operator,
}

/// The bot joined a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotJoinGroupEvent {
    /// The group.
    pub group: Group,
    /// Who invited the bot, if anyone.
    #[serde(default)]
    pub invitor: Option<Member>,
}

/// The bot left a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventActive {
    /// The group.
    pub group: Group,
}

/// The bot was kicked from a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventKick {
    /// The group.
    pub group: Group,
    /// Who kicked the bot.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// A group the bot was in was disbanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotLeaveEventDisband {
    /// The group.
    pub group: Group,
    /// Who disbanded the group.
    #[serde(default)]
    pub operator: Option<Operator>,
}

// =============================================================================
// Groups
// =============================================================================

/// A group message was recalled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecallEvent {
    /// Author of the recalled message.
    pub author_id: i64,
    /// Id of the recalled message.
    pub message_id: i64,
    /// Send time of the recalled message.
    pub time: i64,
    /// The group.
    pub group: Group,
    /// Who recalled it; absent when the bot did.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// Declares group setting change events.
macro_rules! group_setting_events {
    ($($(#[$meta:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                /// Previous value.
                pub origin: $ty,
                /// New value.
                pub current: $ty,
                /// The group.
                pub group: Group,
                /// Who changed it; absent when the bot did.
                #[serde(default)]
                pub operator: Option<Operator>,
            }
        )*
    };
}

group_setting_events! {
    /// The group name changed.
    GroupNameChangeEvent: String,
    /// The group entrance announcement changed.
    GroupEntranceAnnouncementChangeEvent: String,
    /// Mute-all was toggled.
    GroupMuteAllEvent: bool,
    /// Anonymous chat was toggled.
    GroupAllowAnonymousChatEvent: bool,
    /// Member invitations were toggled.
    GroupAllowMemberInviteEvent: bool,
}

/// Confess talk was toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAllowConfessTalkEvent {
    /// Previous value.
    pub origin: bool,
    /// New value.
    pub current: bool,
    /// The group.
    pub group: Group,
    /// Whether the bot made the change.
    #[serde(default)]
    pub is_by_bot: bool,
}

// =============================================================================
// Members
// =============================================================================

/// A member joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberJoinEvent {
    /// The new member.
    pub member: Member,
    /// Who invited them, if anyone.
    #[serde(default)]
    pub invitor: Option<Member>,
}

/// A member was kicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLeaveEventKick {
    /// The kicked member.
    pub member: Member,
    /// Who kicked them; absent when the bot did.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// A member left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLeaveEventQuit {
    /// The member.
    pub member: Member,
}

/// Declares member attribute change events.
macro_rules! member_change_events {
    ($($(#[$meta:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                /// Previous value.
                pub origin: $ty,
                /// New value.
                pub current: $ty,
                /// The member.
                pub member: Member,
            }
        )*
    };
}

member_change_events! {
    /// A member's group card changed.
    MemberCardChangeEvent: String,
    /// A member's special title changed.
    MemberSpecialTitleChangeEvent: String,
    /// A member's permission changed.
    MemberPermissionChangeEvent: Permission,
}

/// A member was muted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMuteEvent {
    /// Mute duration.
    pub duration_seconds: i64,
    /// The muted member.
    pub member: Member,
    /// Who muted them; absent when the bot did.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// A member was unmuted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUnmuteEvent {
    /// The member.
    pub member: Member,
    /// Who unmuted them; absent when the bot did.
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// A member gained or lost an honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberHonorChangeEvent {
    /// The member.
    pub member: Member,
    /// `"achieve"` or `"lose"`.
    pub action: String,
    /// Honor name.
    pub honor: String,
}

// =============================================================================
// Requests
// =============================================================================

/// Answer to a [`NewFriendRequestEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendRequestOperation {
    /// Accept the request.
    Accept = 0,
    /// Reject the request.
    Reject = 1,
    /// Reject and block the sender.
    RejectAndBlock = 2,
}

/// Answer to a [`MemberJoinRequestEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberJoinRequestOperation {
    /// Accept the request.
    Accept = 0,
    /// Reject the request.
    Reject = 1,
    /// Ignore the request.
    Ignore = 2,
    /// Reject and block the applicant.
    RejectAndBlock = 3,
    /// Ignore and block the applicant.
    IgnoreAndBlock = 4,
}

/// Answer to a [`BotInvitedJoinGroupRequestEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitedJoinGroupOperation {
    /// Join the group.
    Accept = 0,
    /// Decline the invitation.
    Reject = 1,
}

fn response_content(event_id: i64, from_id: i64, group_id: i64, operate: i64, message: &str) -> Value {
    json!({
        "eventId": event_id,
        "fromId": from_id,
        "groupId": group_id,
        "operate": operate,
        "message": message,
    })
}

/// Someone asked to become the bot's friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFriendRequestEvent {
    /// Request id.
    pub event_id: i64,
    /// Applicant.
    pub from_id: i64,
    /// Group the applicant came through, 0 if none.
    #[serde(default)]
    pub group_id: i64,
    /// Applicant's nickname.
    #[serde(default)]
    pub nick: String,
    /// Request message.
    #[serde(default)]
    pub message: String,
}

impl NewFriendRequestEvent {
    /// Command answering this request.
    pub const RESPONSE_COMMAND: &'static str = "resp_newFriendRequestEvent";

    /// Builds the response content.
    pub fn response(&self, operation: FriendRequestOperation, message: &str) -> Value {
        response_content(self.event_id, self.from_id, self.group_id, operation as i64, message)
    }
}

/// Someone asked to join a group the bot administers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinRequestEvent {
    /// Request id.
    pub event_id: i64,
    /// Applicant.
    pub from_id: i64,
    /// Target group.
    pub group_id: i64,
    /// Target group name.
    #[serde(default)]
    pub group_name: String,
    /// Applicant's nickname.
    #[serde(default)]
    pub nick: String,
    /// Request message.
    #[serde(default)]
    pub message: String,
    /// Member who invited the applicant, if any.
    #[serde(default)]
    pub invitor_id: Option<i64>,
}

impl MemberJoinRequestEvent {
    /// Command answering this request.
    pub const RESPONSE_COMMAND: &'static str = "resp_memberJoinRequestEvent";

    /// Builds the response content.
    pub fn response(&self, operation: MemberJoinRequestOperation, message: &str) -> Value {
        response_content(self.event_id, self.from_id, self.group_id, operation as i64, message)
    }
}

/// The bot was invited into a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInvitedJoinGroupRequestEvent {
    /// Request id.
    pub event_id: i64,
    /// Inviter.
    pub from_id: i64,
    /// Group the bot is invited into.
    pub group_id: i64,
    /// Group name.
    #[serde(default)]
    pub group_name: String,
    /// Inviter's nickname.
    #[serde(default)]
    pub nick: String,
    /// Invitation message.
    #[serde(default)]
    pub message: String,
}

impl BotInvitedJoinGroupRequestEvent {
    /// Command answering this request.
    pub const RESPONSE_COMMAND: &'static str = "resp_botInvitedJoinGroupRequestEvent";

    /// Builds the response content.
    pub fn response(&self, operation: InvitedJoinGroupOperation, message: &str) -> Value {
        response_content(self.event_id, self.from_id, self.group_id, operation as i64, message)
    }
}

// =============================================================================
// Other clients and commands
// =============================================================================

/// Another client logged into the bot's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherClientOnlineEvent {
    /// The client.
    pub client: Client,
    /// Device kind.
    #[serde(default)]
    pub kind: Option<i64>,
}

/// Another client logged out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherClientOfflineEvent {
    /// The client.
    pub client: Client,
}

/// A console command was executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecutedEvent {
    /// Command name.
    pub name: String,
    /// Issuing friend, if issued from a friend chat.
    #[serde(default)]
    pub friend: Option<Friend>,
    /// Issuing member, if issued from a group.
    #[serde(default)]
    pub member: Option<Member>,
    /// Command arguments.
    #[serde(default)]
    pub args: MessageChain,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn member(id: i64) -> Value {
        json!({
            "id": id,
            "memberName": format!("m{id}"),
            "permission": "MEMBER",
            "group": {"id": 100, "name": "g", "permission": "ADMINISTRATOR"}
        })
    }

    #[test]
    fn test_nested_decode() {
        let event: Event = serde_json::from_value(json!({
            "type": "MemberMuteEvent",
            "durationSeconds": 600,
            "member": member(1),
            "operator": member(2)
        }))
        .unwrap();

        let Event::MemberMuteEvent(mute) = &event else {
            panic!("expected mute event");
        };
        assert_eq!(mute.duration_seconds, 600);
        assert_eq!(mute.operator.as_ref().map(|o| o.id), Some(2));
        assert_eq!(event.origin_id(), None);
    }

    #[test]
    fn test_permission_change() {
        let event: Event = serde_json::from_value(json!({
            "type": "BotGroupPermissionChangeEvent",
            "origin": "MEMBER",
            "current": "ADMINISTRATOR",
            "group": {"id": 1, "name": "g", "permission": "ADMINISTRATOR"}
        }))
        .unwrap();
        let Event::BotGroupPermissionChangeEvent(change) = event else {
            panic!("expected permission change");
        };
        assert_eq!(change.current, Permission::Administrator);
    }

    #[test]
    fn test_origin_and_online() {
        let nudge: Event = serde_json::from_value(json!({
            "type": "NudgeEvent",
            "fromId": 10,
            "subject": {"id": 100, "kind": "Group"},
            "action": "poked",
            "suffix": "",
            "target": 20
        }))
        .unwrap();
        assert_eq!(nudge.origin_id(), Some(10));
        assert_eq!(nudge.online_transition(), None);

        let dropped: Event =
            serde_json::from_value(json!({"type": "BotOfflineEventDropped", "qq": 1})).unwrap();
        assert_eq!(dropped.online_transition(), Some(false));
        assert_eq!(Event::KINDS.len(), 40);
    }

    #[test]
    fn test_request_response_content() {
        let request = MemberJoinRequestEvent {
            event_id: 5,
            from_id: 6,
            group_id: 7,
            group_name: "g".into(),
            nick: "n".into(),
            message: "let me in".into(),
            invitor_id: None,
        };
        assert_eq!(
            request.response(MemberJoinRequestOperation::IgnoreAndBlock, "no"),
            json!({"eventId": 5, "fromId": 6, "groupId": 7, "operate": 4, "message": "no"})
        );
        assert_eq!(FriendRequestOperation::RejectAndBlock as i64, 2);
    }
}
