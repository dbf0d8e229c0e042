//! Typed commands of [`MiraiBot`].
//!
//! Every command builds its content with contacts reduced to ids, goes through
//! [`MiraiBot::call`] and deserializes the unwrapped result.

use serde_json::{Value, json};

use mirai_core::{ApiError, ApiResult};

use crate::bot::MiraiBot;
use crate::model::{
    Announcement, AnnouncementOptions, BotInvitedJoinGroupRequestEvent, ContactId, FileInfo, Friend,
    FriendRequestOperation, Group, GroupConfig, InvitedJoinGroupOperation, Member,
    MemberInfoUpdate, MemberJoinRequestEvent, MemberJoinRequestOperation, MessageChain,
    MessageEvent, NewFriendRequestEvent, Profile, SubjectKind,
};
use crate::upload::UploadTarget;

macro_rules! sub_command {
    () => {
        None
    };
    ($sub:literal) => {
        Some($sub)
    };
}

macro_rules! wire_arg {
    ($arg:ident) => {
        $arg
    };
    ($arg:ident, contact) => {
        Into::<ContactId>::into($arg)
    };
}

macro_rules! impl_api {
    // No return value
    ($(#[$meta:meta])* $name:ident = $command:literal $(: $sub:literal)?,
     ($($arg:ident: $typ:ty => $key:literal $(as $conv:ident)?),*) $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<()> {
            $(let $arg = wire_arg!($arg $(, $conv)?);)*
            self.call($command, sub_command!($($sub)?), json!({ $($key: $arg),* })).await?;
            Ok(())
        }
    };
    // Deserializes the whole result
    ($(#[$meta:meta])* $name:ident = $command:literal $(: $sub:literal)?,
     ($($arg:ident: $typ:ty => $key:literal $(as $conv:ident)?),*) -> $ret:ty $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            $(let $arg = wire_arg!($arg $(, $conv)?);)*
            let result = self
                .call($command, sub_command!($($sub)?), json!({ $($key: $arg),* }))
                .await?;
            Ok(serde_json::from_value::<$ret>(result)?)
        }
    };
}

fn message_id(result: &Value) -> ApiResult<i64> {
    result
        .get("messageId")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::SerializationError("Missing messageId".into()))
}

// =========================================================================
// Messaging
// =========================================================================

impl MiraiBot {
    async fn send_chain(
        &self,
        command: &str,
        mut content: Value,
        chain: MessageChain,
        target: UploadTarget,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        let chain = self.prepare_chain(chain, target).await?;
        content["messageChain"] = Value::Array(chain.to_json_list());
        if let Some(quote) = quote {
            content["quote"] = json!(quote);
        }
        let result = self.call(command, None, content).await?;
        message_id(&result)
    }

    /// Sends a message to a friend and returns its message id.
    ///
    /// `quote` replies to an earlier message.
    pub async fn send_friend_message(
        &self,
        target: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.send_chain(
            "sendFriendMessage",
            json!({ "target": Into::<ContactId>::into(target) }),
            chain.into(),
            UploadTarget::Friend,
            quote,
        )
        .await
    }

    /// Sends a message to a group and returns its message id.
    pub async fn send_group_message(
        &self,
        target: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.send_chain(
            "sendGroupMessage",
            json!({ "target": Into::<ContactId>::into(target) }),
            chain.into(),
            UploadTarget::Group,
            quote,
        )
        .await
    }

    /// Sends a temporary-session message to a group member.
    pub async fn send_temp_message(
        &self,
        member_id: impl Into<ContactId>,
        group: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.send_chain(
            "sendTempMessage",
            json!({
                "qq": Into::<ContactId>::into(member_id),
                "group": Into::<ContactId>::into(group),
            }),
            chain.into(),
            UploadTarget::Temp,
            quote,
        )
        .await
    }

    impl_api!(
        /// Nudges `target` inside `subject` (a friend, group or stranger).
        send_nudge = "sendNudge",
        (target: impl Into<ContactId> => "target" as contact, subject: impl Into<ContactId> => "subject" as contact, kind: SubjectKind => "kind")
    );

    impl_api!(
        /// Recalls a message sent in `target`.
        recall = "recall",
        (target: impl Into<ContactId> => "target" as contact, message_id: i64 => "messageId")
    );

    impl_api!(
        /// Fetches a cached message by id.
        message_from_id = "messageFromId",
        (target: impl Into<ContactId> => "target" as contact, message_id: i64 => "messageId") -> MessageEvent
    );

    // =========================================================================
    // Queries
    // =========================================================================

    impl_api!(
        /// Lists the bot's friends.
        friend_list = "friendList",
        () -> Vec<Friend>
    );

    impl_api!(
        /// Lists the bot's groups.
        group_list = "groupList",
        () -> Vec<Group>
    );

    impl_api!(
        /// Lists the members of a group.
        member_list = "memberList",
        (target: impl Into<ContactId> => "target" as contact) -> Vec<Member>
    );

    impl_api!(
        /// Gets the bot's own profile.
        bot_profile = "botProfile",
        () -> Profile
    );

    impl_api!(
        /// Gets a friend's profile.
        friend_profile = "friendProfile",
        (target: impl Into<ContactId> => "target" as contact) -> Profile
    );

    impl_api!(
        /// Gets a group member's profile.
        member_profile = "memberProfile",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact) -> Profile
    );

    impl_api!(
        /// Gets any account's profile.
        user_profile = "userProfile",
        (target: impl Into<ContactId> => "target" as contact) -> Profile
    );

    // =========================================================================
    // Friend management
    // =========================================================================

    impl_api!(
        /// Removes a friend.
        delete_friend = "deleteFriend",
        (target: impl Into<ContactId> => "target" as contact)
    );

    // =========================================================================
    // Group administration
    // =========================================================================

    impl_api!(
        /// Mutes a member.
        ///
        /// # Arguments
        /// * `target` - Group id
        /// * `member_id` - Member to mute
        /// * `time` - Duration in seconds
        mute = "mute",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact, time: u32 => "time")
    );

    impl_api!(
        /// Unmutes a member.
        unmute = "unmute",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact)
    );

    impl_api!(
        /// Removes a member from a group.
        kick = "kick",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact, msg: &str => "msg")
    );

    impl_api!(
        /// Leaves a group.
        quit = "quit",
        (target: impl Into<ContactId> => "target" as contact)
    );

    impl_api!(
        /// Mutes everyone in a group.
        mute_all = "muteAll",
        (target: impl Into<ContactId> => "target" as contact)
    );

    impl_api!(
        /// Lifts the group-wide mute.
        unmute_all = "unmuteAll",
        (target: impl Into<ContactId> => "target" as contact)
    );

    impl_api!(
        /// Marks a group message as essence.
        set_essence = "setEssence",
        (target: impl Into<ContactId> => "target" as contact, message_id: i64 => "messageId")
    );

    impl_api!(
        /// Gets a group's settings.
        group_config = "groupConfig": "get",
        (target: impl Into<ContactId> => "target" as contact) -> GroupConfig
    );

    impl_api!(
        /// Updates a group's settings. Unset fields stay unchanged.
        update_group_config = "groupConfig": "update",
        (target: impl Into<ContactId> => "target" as contact, config: GroupConfig => "config")
    );

    impl_api!(
        /// Gets a member's group card and title.
        member_info = "memberInfo": "get",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact) -> Member
    );

    impl_api!(
        /// Updates a member's group card or title.
        update_member_info = "memberInfo": "update",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact, info: MemberInfoUpdate => "info")
    );

    impl_api!(
        /// Grants or revokes administrator rights.
        member_admin = "memberAdmin",
        (target: impl Into<ContactId> => "target" as contact, member_id: impl Into<ContactId> => "memberId" as contact, assign: bool => "assign")
    );

    // =========================================================================
    // Group files
    // =========================================================================

    impl_api!(
        /// Lists a directory of a group's file area. An empty `id` is the root.
        file_list = "file_list",
        (
            target: impl Into<ContactId> => "target" as contact,
            id: &str => "id",
            with_download_info: bool => "withDownloadInfo",
            offset: u32 => "offset",
            size: u32 => "size"
        ) -> Vec<FileInfo>
    );

    impl_api!(
        /// Gets one file or directory.
        file_info = "file_info",
        (target: impl Into<ContactId> => "target" as contact, id: &str => "id", with_download_info: bool => "withDownloadInfo") -> FileInfo
    );

    impl_api!(
        /// Creates a directory under `id`.
        file_mkdir = "file_mkdir",
        (target: impl Into<ContactId> => "target" as contact, id: &str => "id", directory_name: &str => "directoryName") -> FileInfo
    );

    impl_api!(
        /// Deletes a file or directory.
        file_delete = "file_delete",
        (target: impl Into<ContactId> => "target" as contact, id: &str => "id")
    );

    impl_api!(
        /// Moves a file into the directory `move_to`.
        file_move = "file_move",
        (target: impl Into<ContactId> => "target" as contact, id: &str => "id", move_to: &str => "moveTo")
    );

    impl_api!(
        /// Renames a file or directory.
        file_rename = "file_rename",
        (target: impl Into<ContactId> => "target" as contact, id: &str => "id", rename_to: &str => "renameTo")
    );

    // =========================================================================
    // Announcements
    // =========================================================================

    impl_api!(
        /// Lists a group's announcements.
        announcement_list = "anno_list",
        (target: impl Into<ContactId> => "id" as contact, offset: u32 => "offset", size: u32 => "size") -> Vec<Announcement>
    );

    /// Publishes an announcement.
    pub async fn announcement_publish(
        &self,
        target: impl Into<ContactId>,
        content: &str,
        options: AnnouncementOptions,
    ) -> ApiResult<Announcement> {
        let mut body = serde_json::to_value(options)?;
        body["target"] = json!(Into::<ContactId>::into(target));
        body["content"] = json!(content);
        let result = self.call("anno_publish", None, body).await?;
        Ok(serde_json::from_value(result)?)
    }

    impl_api!(
        /// Deletes an announcement.
        announcement_delete = "anno_delete",
        (target: impl Into<ContactId> => "id" as contact, fid: &str => "fid")
    );

    // =========================================================================
    // Request events
    // =========================================================================

    /// Answers a friend request.
    pub async fn respond_friend_request(
        &self,
        event: &NewFriendRequestEvent,
        operation: FriendRequestOperation,
        message: &str,
    ) -> ApiResult<()> {
        self.call(
            NewFriendRequestEvent::RESPONSE_COMMAND,
            None,
            event.response(operation, message),
        )
        .await?;
        Ok(())
    }

    /// Answers a request to join a group the bot administers.
    pub async fn respond_member_join_request(
        &self,
        event: &MemberJoinRequestEvent,
        operation: MemberJoinRequestOperation,
        message: &str,
    ) -> ApiResult<()> {
        self.call(
            MemberJoinRequestEvent::RESPONSE_COMMAND,
            None,
            event.response(operation, message),
        )
        .await?;
        Ok(())
    }

    /// Answers an invitation for the bot to join a group.
    pub async fn respond_invited_join_group_request(
        &self,
        event: &BotInvitedJoinGroupRequestEvent,
        operation: InvitedJoinGroupOperation,
        message: &str,
    ) -> ApiResult<()> {
        self.call(
            BotInvitedJoinGroupRequestEvent::RESPONSE_COMMAND,
            None,
            event.response(operation, message),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id() {
        assert_eq!(message_id(&json!({"code": 0, "msg": "", "messageId": 7})).unwrap(), 7);
        assert!(matches!(
            message_id(&json!({"code": 0})),
            Err(ApiError::SerializationError(_))
        ));
    }
}
