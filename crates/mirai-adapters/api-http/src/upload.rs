//! Media upload over the gateway's HTTP side.
//!
//! | Media | Path | File field |
//! |-------|------|------------|
//! | image | `/uploadImage` | `img` |
//! | voice | `/uploadVoice` | `voice` |
//! | group file | `/file/upload` | `file` |
//!
//! Every request carries the current `sessionKey` and the upload `type`.

use serde_json::Value;
use tracing::{debug, info};

use mirai_core::{ApiError, ApiResult};
use mirai_transport::{FilePart, MultipartBody};

use crate::bot::MiraiBot;
use crate::model::{Element, FileInfo, Image, MediaSource, MessageChain, Voice};

/// Where uploaded media is going to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// A friend.
    Friend,
    /// A group.
    Group,
    /// A temporary session with a group member.
    Temp,
}

impl UploadTarget {
    /// Returns the `type` form value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Group => "group",
            Self::Temp => "temp",
        }
    }
}

/// Unwraps an upload reply, mapping a nonzero `code` to its error.
fn upload_reply(reply: Value) -> ApiResult<Value> {
    if let Some(code) = reply.get("code").and_then(Value::as_i64) {
        let message = reply.get("msg").and_then(Value::as_str).unwrap_or_default();
        if let Some(err) = ApiError::from_status(code, message) {
            return Err(err);
        }
    }
    Ok(match reply {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    })
}

impl MiraiBot {
    async fn upload(
        &self,
        path: &str,
        field: &str,
        upload_type: &str,
        extra: &[(&str, String)],
        source: &MediaSource,
    ) -> ApiResult<Value> {
        let session_key = self.session_key().ok_or(ApiError::NotConnected)?;
        let (file_name, bytes) = source
            .load()
            .await
            .map_err(|e| ApiError::Upload(format!("failed to read media: {e}")))?;

        debug!(path = %path, file = %file_name, size = bytes.len(), "Uploading media");

        let mut body = MultipartBody::new()
            .text("sessionKey", session_key)
            .text("type", upload_type);
        for (name, value) in extra {
            body = body.text(*name, value.clone());
        }
        let body = body.file(FilePart {
            field: field.to_string(),
            file_name,
            mime: "application/octet-stream".to_string(),
            bytes,
        });

        let reply = self
            .http
            .post_multipart(path, body)
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        upload_reply(reply)
    }

    /// Uploads an image and returns the element referring to it.
    pub async fn upload_image(&self, target: UploadTarget, source: &MediaSource) -> ApiResult<Image> {
        let reply = self
            .upload("/uploadImage", "img", target.as_str(), &[], source)
            .await?;
        let mut image = Image::default();
        image.apply_upload(&reply);
        Ok(image)
    }

    /// Uploads a voice clip and returns the element referring to it.
    pub async fn upload_voice(&self, target: UploadTarget, source: &MediaSource) -> ApiResult<Voice> {
        let reply = self
            .upload("/uploadVoice", "voice", target.as_str(), &[], source)
            .await?;
        let mut voice = Voice::default();
        voice.apply_upload(&reply);
        Ok(voice)
    }

    /// Uploads a file into the directory `path` of a group's file area.
    pub async fn upload_file(&self, group: i64, path: &str, source: &MediaSource) -> ApiResult<FileInfo> {
        let extra = [("target", group.to_string()), ("path", path.to_string())];
        let reply = self
            .upload("/file/upload", "file", "group", &extra, source)
            .await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Uploads every image, flash image and voice in `chain` that only has
    /// local data, filling in the gateway-assigned ids.
    pub async fn prepare_chain(
        &self,
        mut chain: MessageChain,
        target: UploadTarget,
    ) -> ApiResult<MessageChain> {
        let mut uploaded = 0;
        for element in chain.iter_mut() {
            match element {
                Element::Image(image) | Element::FlashImage(image) if image.needs_upload() => {
                    if let Some(source) = image.source.clone() {
                        let reply = self
                            .upload("/uploadImage", "img", target.as_str(), &[], &source)
                            .await?;
                        image.apply_upload(&reply);
                        uploaded += 1;
                    }
                }
                Element::Voice(voice) if voice.needs_upload() => {
                    if let Some(source) = voice.source.clone() {
                        let reply = self
                            .upload("/uploadVoice", "voice", target.as_str(), &[], &source)
                            .await?;
                        voice.apply_upload(&reply);
                        uploaded += 1;
                    }
                }
                _ => {}
            }
        }
        if uploaded > 0 {
            info!(account = self.account(), count = uploaded, "Uploaded chain media");
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MiraiConfig;

    #[test]
    fn test_upload_reply() {
        let reply = upload_reply(json!({"imageId": "{A}.jpg", "url": "http://x"})).unwrap();
        assert_eq!(reply["imageId"], "{A}.jpg");

        let reply = upload_reply(json!({"code": 0, "msg": "", "data": {"name": "a.txt"}})).unwrap();
        assert_eq!(reply, json!({"name": "a.txt"}));

        assert!(matches!(
            upload_reply(json!({"code": 3, "msg": "bad session"})),
            Err(ApiError::SessionInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_prepare_chain_without_local_media_is_untouched() {
        let bot = MiraiBot::new(MiraiConfig::default()).unwrap();
        let chain = MessageChain::from("hello").with(Image::from_id("{A}.jpg"));
        let prepared = bot.prepare_chain(chain.clone(), UploadTarget::Group).await.unwrap();
        assert_eq!(prepared, chain);
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let bot = MiraiBot::new(MiraiConfig::default()).unwrap();
        let source = MediaSource::Bytes {
            file_name: "a.png".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            bot.upload_image(UploadTarget::Friend, &source).await,
            Err(ApiError::NotConnected)
        ));
    }
}
