//! Message chain elements.
//!
//! Every element is tagged by its `type` field on the wire. Image and voice
//! elements built from local data carry a [`MediaSource`] that is uploaded
//! before the chain is sent; see [`MiraiBot::prepare_chain`].
//!
//! [`MiraiBot::prepare_chain`]: crate::MiraiBot::prepare_chain

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chain::MessageChain;

// =============================================================================
// Local media
// =============================================================================

/// Local data for an image or voice that still has to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A file on disk, read at upload time.
    Path(PathBuf),
    /// In-memory contents.
    Bytes {
        /// File name reported to the gateway.
        file_name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

impl MediaSource {
    /// Reads the contents, returning the file name and bytes.
    pub async fn load(&self) -> std::io::Result<(String, Vec<u8>)> {
        match self {
            Self::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string());
                Ok((file_name, bytes))
            }
            Self::Bytes { file_name, bytes } => Ok((file_name.clone(), bytes.clone())),
        }
    }
}

fn reply_str(reply: &Value, key: &str) -> Option<String> {
    reply.get(key).and_then(Value::as_str).map(str::to_string)
}

// =============================================================================
// Element payloads
// =============================================================================

/// Identifies a message; always the first element of a received chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Message id, used for quoting and recalling.
    pub id: i64,
    /// Send time as a unix timestamp.
    pub time: i64,
}

/// A reply to an earlier message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Id of the quoted message.
    pub id: i64,
    /// Group of the quoted message, 0 for private chats.
    #[serde(default)]
    pub group_id: i64,
    /// Sender of the quoted message.
    #[serde(default)]
    pub sender_id: i64,
    /// Receiver of the quoted message.
    #[serde(default)]
    pub target_id: i64,
    /// Content of the quoted message.
    #[serde(default)]
    pub origin: MessageChain,
}

/// Mentions a group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct At {
    /// Account being mentioned.
    pub target: i64,
    /// Text shown for the mention; ignored when sending.
    #[serde(default)]
    pub display: String,
}

/// A built-in face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    /// Face id; takes precedence over `name` when sending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_id: Option<i64>,
    /// Face name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plain {
    /// The text.
    pub text: String,
}

/// An image, also used for flash images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Gateway-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path on the gateway host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 encoded contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Local data still to be uploaded.
    #[serde(skip)]
    pub source: Option<MediaSource>,
}

impl Image {
    /// An image already known to the gateway.
    pub fn from_id(image_id: impl Into<String>) -> Self {
        Self {
            image_id: Some(image_id.into()),
            ..Default::default()
        }
    }

    /// An image the gateway downloads itself.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// A local file, uploaded before sending.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            source: Some(MediaSource::Path(path.as_ref().to_path_buf())),
            ..Default::default()
        }
    }

    /// In-memory contents, uploaded before sending.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: Some(MediaSource::Bytes {
                file_name: file_name.into(),
                bytes,
            }),
            ..Default::default()
        }
    }

    /// Returns `true` if local data has to be uploaded first.
    pub fn needs_upload(&self) -> bool {
        self.image_id.is_none() && self.source.is_some()
    }

    /// Merges an upload reply (`imageId`, `url`) into this element.
    pub fn apply_upload(&mut self, reply: &Value) {
        if let Some(id) = reply_str(reply, "imageId") {
            self.image_id = Some(id);
        }
        if let Some(url) = reply_str(reply, "url") {
            self.url = Some(url);
        }
        self.source = None;
    }
}

/// A voice clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// Gateway-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path on the gateway host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 encoded contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    /// Local data still to be uploaded.
    #[serde(skip)]
    pub source: Option<MediaSource>,
}

impl Voice {
    /// A voice clip already known to the gateway.
    pub fn from_id(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: Some(voice_id.into()),
            ..Default::default()
        }
    }

    /// A local file, uploaded before sending.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            source: Some(MediaSource::Path(path.as_ref().to_path_buf())),
            ..Default::default()
        }
    }

    /// In-memory contents, uploaded before sending.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: Some(MediaSource::Bytes {
                file_name: file_name.into(),
                bytes,
            }),
            ..Default::default()
        }
    }

    /// Returns `true` if local data has to be uploaded first.
    pub fn needs_upload(&self) -> bool {
        self.voice_id.is_none() && self.source.is_some()
    }

    /// Merges an upload reply (`voiceId`, `url`) into this element.
    pub fn apply_upload(&mut self, reply: &Value) {
        if let Some(id) = reply_str(reply, "voiceId") {
            self.voice_id = Some(id);
        }
        if let Some(url) = reply_str(reply, "url") {
            self.url = Some(url);
        }
        self.source = None;
    }
}

/// An XML card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xml {
    /// The XML document.
    pub xml: String,
}

/// A JSON card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Json {
    /// The JSON document as a string.
    pub json: String,
}

/// A mini-program card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Card content.
    pub content: String,
}

/// A poke message, e.g. `"Poke"`, `"ShowLove"`, `"Like"`, `"SixSixSix"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poke {
    /// Poke name.
    pub name: String,
}

/// A dice roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    /// Rolled value.
    pub value: i64,
}

/// A store sticker. Can only be received and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFace {
    /// Sticker id.
    pub id: i64,
    /// Sticker name.
    pub name: String,
}

/// A music share card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MusicShare {
    /// Provider kind.
    pub kind: String,
    /// Title.
    pub title: String,
    /// Summary.
    pub summary: String,
    /// Link opened on click.
    pub jump_url: String,
    /// Cover URL.
    pub picture_url: String,
    /// Audio URL.
    pub music_url: String,
    /// Text shown in the chat list.
    pub brief: String,
}

/// One message inside a forwarded bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardNode {
    /// Original sender.
    #[serde(default)]
    pub sender_id: i64,
    /// Original send time.
    #[serde(default)]
    pub time: i64,
    /// Name shown for the sender.
    #[serde(default)]
    pub sender_name: String,
    /// Message content.
    #[serde(default)]
    pub message_chain: MessageChain,
    /// Id of an existing message to forward instead of `message_chain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

/// A bundle of forwarded messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forward {
    /// The forwarded messages.
    pub node_list: Vec<ForwardNode>,
}

/// A group file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File id.
    pub id: String,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
}

/// Mirai code, parsed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiraiCode {
    /// The code.
    pub code: String,
}

// =============================================================================
// Element
// =============================================================================

/// A message chain element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    Source(Source),
    Quote(Quote),
    At(At),
    AtAll,
    Face(Face),
    Plain(Plain),
    Image(Image),
    FlashImage(Image),
    Voice(Voice),
    Xml(Xml),
    Json(Json),
    App(App),
    Poke(Poke),
    Dice(Dice),
    MarketFace(MarketFace),
    MusicShare(MusicShare),
    #[serde(alias = "ForwardMessage")]
    Forward(Forward),
    File(File),
    MiraiCode(MiraiCode),
}

impl Element {
    /// Returns the wire discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Source(_) => "Source",
            Self::Quote(_) => "Quote",
            Self::At(_) => "At",
            Self::AtAll => "AtAll",
            Self::Face(_) => "Face",
            Self::Plain(_) => "Plain",
            Self::Image(_) => "Image",
            Self::FlashImage(_) => "FlashImage",
            Self::Voice(_) => "Voice",
            Self::Xml(_) => "Xml",
            Self::Json(_) => "Json",
            Self::App(_) => "App",
            Self::Poke(_) => "Poke",
            Self::Dice(_) => "Dice",
            Self::MarketFace(_) => "MarketFace",
            Self::MusicShare(_) => "MusicShare",
            Self::Forward(_) => "Forward",
            Self::File(_) => "File",
            Self::MiraiCode(_) => "MiraiCode",
        }
    }

    /// Plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(Plain { text: text.into() })
    }

    /// Mentions `target`.
    pub fn at(target: i64) -> Self {
        Self::At(At {
            target,
            display: String::new(),
        })
    }

    /// A face by id.
    pub fn face(face_id: i64) -> Self {
        Self::Face(Face {
            face_id: Some(face_id),
            name: None,
        })
    }

    /// A poke message.
    pub fn poke(name: impl Into<String>) -> Self {
        Self::Poke(Poke { name: name.into() })
    }

    /// Mirai code.
    pub fn mirai_code(code: impl Into<String>) -> Self {
        Self::MiraiCode(MiraiCode { code: code.into() })
    }

    /// Returns the text of a `Plain` element.
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(p) => Some(&p.text),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(s) => write!(f, "[Source:{}]", s.id),
            Self::Quote(q) => write!(f, "[Quote:{}]", q.id),
            Self::At(a) if a.display.is_empty() => write!(f, "@{}", a.target),
            Self::At(a) => f.write_str(&a.display),
            Self::AtAll => f.write_str("@all"),
            Self::Face(face) => match (&face.name, face.face_id) {
                (Some(name), _) => write!(f, "[Face:{name}]"),
                (None, Some(id)) => write!(f, "[Face:{id}]"),
                (None, None) => f.write_str("[Face]"),
            },
            Self::Plain(p) => f.write_str(&p.text),
            Self::Image(i) => write!(f, "[Image:{}]", i.image_id.as_deref().unwrap_or("")),
            Self::FlashImage(i) => {
                write!(f, "[FlashImage:{}]", i.image_id.as_deref().unwrap_or(""))
            }
            Self::Voice(v) => write!(f, "[Voice:{}]", v.voice_id.as_deref().unwrap_or("")),
            Self::Xml(_) => f.write_str("[Xml]"),
            Self::Json(_) => f.write_str("[Json]"),
            Self::App(_) => f.write_str("[App]"),
            Self::Poke(p) => write!(f, "[Poke:{}]", p.name),
            Self::Dice(d) => write!(f, "[Dice:{}]", d.value),
            Self::MarketFace(m) => write!(f, "[MarketFace:{}]", m.name),
            Self::MusicShare(m) => write!(f, "[MusicShare:{}]", m.title),
            Self::Forward(fw) => write!(f, "[Forward:{}]", fw.node_list.len()),
            Self::File(file) => write!(f, "[File:{}]", file.name),
            Self::MiraiCode(m) => f.write_str(&m.code),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<Image> for Element {
    fn from(image: Image) -> Self {
        Self::Image(image)
    }
}

impl From<Voice> for Element {
    fn from(voice: Voice) -> Self {
        Self::Voice(voice)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tagged_decode() {
        let at: Element = serde_json::from_value(json!({"type": "At", "target": 5, "display": "@bob"})).unwrap();
        assert_eq!(at.kind(), "At");
        assert_eq!(at.to_string(), "@bob");

        let all: Element = serde_json::from_value(json!({"type": "AtAll"})).unwrap();
        assert_eq!(all, Element::AtAll);

        let forward: Element =
            serde_json::from_value(json!({"type": "ForwardMessage", "nodeList": []})).unwrap();
        assert_eq!(forward.kind(), "Forward");

    }

    #[test]
    fn test_unknown_element_type_is_an_error() {
        let unknown = serde_json::from_value::<Element>(json!({"type": "ShortVideo", "videoId": "x"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_image_serialization_skips_local_source() {
        let image = Image::from_bytes("a.png", vec![1, 2, 3]);
        assert!(image.needs_upload());
        assert_eq!(
            serde_json::to_value(Element::Image(image)).unwrap(),
            json!({"type": "Image"})
        );
    }

    #[test]
    fn test_apply_upload() {
        let mut voice = Voice::from_path("/tmp/v.amr");
        voice.apply_upload(&json!({"voiceId": "v-1", "url": "http://x/v"}));
        assert_eq!(voice.voice_id.as_deref(), Some("v-1"));
        assert!(!voice.needs_upload());
        assert!(voice.source.is_none());
    }

    #[tokio::test]
    async fn test_load_bytes_source() {
        let source = MediaSource::Bytes {
            file_name: "a.png".into(),
            bytes: vec![9],
        };
        assert_eq!(source.load().await.unwrap(), ("a.png".to_string(), vec![9]));
    }
}
