//! Declarative listener parameters.
//!
//! Contact and chain types bind from named payload fields, so a listener only
//! states what it needs:
//!
//! ```rust,ignore
//! async fn on_message(bot: Arc<MiraiBot>, group: Group, member: Option<Member>, chain: MessageChain) {
//!     // runs for every push carrying a group, e.g. GroupMessage or MemberJoinEvent
//! }
//! ```
//!
//! Each type tries its bindings in order and takes the first field that is
//! present and decodes. A required parameter with no match skips the
//! listener; an `Option` parameter becomes `None`.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use mirai_framework::{DispatchContext, ExtractError, ExtractResult, FromContext};

use crate::model::{
    Client, Friend, Group, Incoming, Member, MessageChain, Operator, Stranger, Subject,
};

/// One place a type can be found in a push payload.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    /// JSON pointer of the field.
    pub pointer: &'static str,
    /// Push kinds the binding applies to; empty means every kind.
    pub kinds: &'static [&'static str],
}

impl Binding {
    const fn any(pointer: &'static str) -> Self {
        Self { pointer, kinds: &[] }
    }

    const fn only(pointer: &'static str, kinds: &'static [&'static str]) -> Self {
        Self { pointer, kinds }
    }

    fn applies_to(&self, kind: &str) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

/// A type bound from payload fields.
pub trait FieldBinding: DeserializeOwned {
    /// Candidate fields, in priority order.
    const BINDINGS: &'static [Binding];

    /// Binds from the first matching field.
    fn bind(ctx: &DispatchContext) -> ExtractResult<Self> {
        let kind = ctx.event().event_name();
        Self::BINDINGS
            .iter()
            .filter(|b| b.applies_to(kind))
            .filter_map(|b| ctx.field(b.pointer))
            .find_map(|v| Deserialize::deserialize(v).ok())
            .ok_or(ExtractError::MissingField {
                expected: std::any::type_name::<Self>(),
            })
    }
}

macro_rules! field_bindings {
    ($($ty:ty => [$($binding:expr),* $(,)?];)*) => {
        $(
            impl FieldBinding for $ty {
                const BINDINGS: &'static [Binding] = &[$($binding),*];
            }

            impl FromContext for $ty {
                fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
                    <$ty as FieldBinding>::bind(ctx)
                }
            }
        )*
    };
}

field_bindings! {
    Group => [
        Binding::any("/group"),
        Binding::any("/sender/group"),
        Binding::any("/member/group"),
        Binding::any("/operator/group"),
        Binding::only("/subject", &["GroupSyncMessage"]),
        Binding::only("/subject/group", &["TempSyncMessage"]),
    ];
    Member => [
        Binding::any("/member"),
        Binding::only("/sender", &["GroupMessage", "TempMessage"]),
        Binding::only("/subject", &["TempSyncMessage"]),
    ];
    Operator => [
        Binding::any("/operator"),
    ];
    Friend => [
        Binding::any("/friend"),
        Binding::only("/sender", &["FriendMessage"]),
        Binding::only("/subject", &["FriendSyncMessage"]),
    ];
    Stranger => [
        Binding::only("/sender", &["StrangerMessage"]),
        Binding::only("/subject", &["StrangerSyncMessage"]),
    ];
    Client => [
        Binding::any("/client"),
        Binding::only("/sender", &["OtherClientMessage"]),
    ];
    Subject => [
        Binding::only("/subject", &["NudgeEvent"]),
    ];
    MessageChain => [
        Binding::any("/messageChain"),
        Binding::only("/args", &["CommandExecutedEvent"]),
    ];
}

/// The whole decoded push.
impl FromContext for Incoming {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        ctx.event()
            .downcast_ref::<Incoming>()
            .cloned()
            .ok_or(ExtractError::EventTypeMismatch {
                expected: "Incoming",
                got: ctx.event().event_name(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use mirai_core::{ApiResult, Bot, BoxedEvent};

    use super::*;
    use crate::model::{Permission, SubjectKind};

    struct NullBot;

    #[async_trait]
    impl Bot for NullBot {
        fn id(&self) -> &str {
            "0"
        }

        async fn call_api(&self, _: &str, _: Option<&str>, _: Value) -> ApiResult<Value> {
            Ok(Value::Null)
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn context(payload: Value) -> DispatchContext {
        let incoming = Incoming::decode(&payload).unwrap();
        DispatchContext::new(BoxedEvent::new(incoming), Arc::new(NullBot))
    }

    fn member(id: i64, group: i64) -> Value {
        json!({
            "id": id,
            "memberName": "m",
            "permission": "MEMBER",
            "group": {"id": group, "name": "g", "permission": "ADMINISTRATOR"}
        })
    }

    #[test]
    fn test_group_message_bindings() {
        let ctx = context(json!({
            "type": "GroupMessage",
            "sender": member(20002, 123),
            "messageChain": [{"type": "Plain", "text": "hi"}]
        }));

        let group = Group::from_context(&ctx).unwrap();
        assert_eq!(group.id, 123);
        assert_eq!(group.permission, Permission::Administrator);

        assert_eq!(Member::from_context(&ctx).unwrap().id, 20002);
        assert_eq!(MessageChain::from_context(&ctx).unwrap().to_text(), "hi");

        // Absent fields skip required parameters and yield None for optional ones.
        assert!(matches!(
            Friend::from_context(&ctx),
            Err(ExtractError::MissingField { .. })
        ));
        assert!(Option::<Operator>::from_context(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_sender_binding_is_kind_specific() {
        let ctx = context(json!({
            "type": "FriendMessage",
            "sender": {"id": 30003, "nickname": "f", "remark": ""},
            "messageChain": []
        }));
        assert_eq!(Friend::from_context(&ctx).unwrap().id, 30003);
        assert!(Member::from_context(&ctx).is_err());
        assert!(Stranger::from_context(&ctx).is_err());
    }

    #[test]
    fn test_event_bindings() {
        let ctx = context(json!({
            "type": "MemberMuteEvent",
            "durationSeconds": 60,
            "member": member(20002, 123),
            "operator": member(40004, 123)
        }));
        assert_eq!(Member::from_context(&ctx).unwrap().id, 20002);
        assert_eq!(Operator::from_context(&ctx).unwrap().id, 40004);
        assert_eq!(Group::from_context(&ctx).unwrap().id, 123);

        let ctx = context(json!({
            "type": "NudgeEvent",
            "fromId": 1,
            "subject": {"id": 123, "kind": "Group"},
            "action": "",
            "suffix": "",
            "target": 2
        }));
        let subject = Subject::from_context(&ctx).unwrap();
        assert_eq!(subject.kind, SubjectKind::Group);
        assert!(Incoming::from_context(&ctx).is_ok());
    }
}
