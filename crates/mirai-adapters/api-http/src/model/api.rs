//! Command request and response types.

use serde::{Deserialize, Serialize};

use super::contact::Group;

/// Profile of an account, returned by the `*Profile` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Nickname.
    pub nickname: String,
    /// Email address.
    pub email: String,
    /// Age.
    pub age: i64,
    /// Account level.
    pub level: i64,
    /// Signature.
    pub sign: String,
    /// `"MALE"`, `"FEMALE"` or `"UNKNOWN"`.
    pub sex: String,
}

/// Group settings. Unset fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupConfig {
    /// Group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Entrance announcement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    /// Confess talk enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confess_talk: Option<bool>,
    /// Members may invite others.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_member_invite: Option<bool>,
    /// Join requests are approved automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    /// Anonymous chat enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous_chat: Option<bool>,
    /// Everyone is muted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_all: Option<bool>,
}

/// Member settings to update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberInfoUpdate {
    /// Group card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Special title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_title: Option<String>,
}

/// Download details of a group file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadInfo {
    /// SHA-1 digest.
    pub sha1: String,
    /// MD5 digest.
    pub md5: String,
    /// Download count.
    pub download_times: i64,
    /// Uploader account.
    pub uploader_id: i64,
    /// Upload time as a unix timestamp.
    pub upload_time: i64,
    /// Last modification time as a unix timestamp.
    pub last_modify_time: i64,
    /// Download URL.
    pub url: String,
}

/// A file or directory in a group's file area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    /// File name.
    pub name: String,
    /// File id; the root directory has none.
    pub id: Option<String>,
    /// Full path.
    pub path: String,
    /// Parent directory.
    pub parent: Option<Box<FileInfo>>,
    /// Group the file belongs to.
    pub contact: Option<Group>,
    /// Whether this is a file.
    pub is_file: bool,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Download details, when requested.
    pub download_info: Option<DownloadInfo>,
}

/// A group announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    /// The group.
    pub group: Group,
    /// Text.
    pub content: String,
    /// Publisher account.
    #[serde(default)]
    pub sender_id: i64,
    /// Announcement id.
    pub fid: String,
    /// Whether every member confirmed it.
    #[serde(default)]
    pub all_confirmed: bool,
    /// Number of members that confirmed it.
    #[serde(default)]
    pub confirmed_members_count: i64,
    /// Publication time as a unix timestamp.
    #[serde(default)]
    pub publication_time: i64,
}

/// Options for publishing an announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementOptions {
    /// Show to new members.
    pub send_to_new_member: bool,
    /// Pin to the top.
    pub pinned: bool,
    /// Show the edit-card prompt.
    pub show_edit_card: bool,
    /// Show as a popup.
    pub show_popup: bool,
    /// Require members to confirm.
    pub require_confirmation: bool,
    /// Cover image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
