//! Echo Bot Example
//!
//! A small bot showing how listeners declare what they need as parameters.
//!
//! ```text
//! GroupMessage ──▶ log_message, group_commands
//! FriendMessage ─▶ log_message, friend_commands
//! NudgeEvent ────▶ nudge_back
//! NewFriendRequestEvent ─▶ accept_friend
//! ```
//!
//! # Usage
//!
//! ```bash
//! MIRAI_BOT__ACCOUNT=10001 MIRAI_BOT__VERIFY_KEY=secret cargo run --package echo-bot
//! cargo run --package echo-bot -- --config mirai.yaml --profile production
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mirai::api_http::{FriendRequestOperation, NewFriendRequestEvent, NudgeEvent, SubjectKind};
use mirai::prelude::*;

#[derive(Debug, Parser)]
#[command(about = "Echo bot for mirai-api-http")]
struct Args {
    /// Configuration file (mirai.toml / mirai.yaml in the current directory by default).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,
}

const HELP: &str = "\
/echo <text>  echo text
/ping         pong
/info         message info
/help         this help";

// ============================================================================
// Listeners
// ============================================================================

fn log_message(incoming: Incoming, chain: MessageChain) {
    info!(kind = incoming.kind(), "{}", chain.to_str());
}

/// Builds the reply to a command, if the text is one.
fn reply_for(text: &str, info: impl FnOnce() -> String) -> Option<MessageChain> {
    let text = text.trim();
    if let Some(content) = text.strip_prefix("/echo ") {
        return Some(content.into());
    }
    match text {
        "/ping" => Some("Pong!".into()),
        "/help" => Some(HELP.into()),
        "/info" => Some(info().into()),
        _ => None,
    }
}

async fn group_commands(bot: Arc<MiraiBot>, msg: GroupMessage) -> ApiResult<()> {
    let info = || {
        format!(
            "Group: {} ({})\nFrom: {} ({})\nMessage id: {}",
            msg.group().name,
            msg.group().id,
            msg.sender.member_name,
            msg.sender.id,
            msg.message_chain.message_id().unwrap_or_default(),
        )
    };
    if let Some(reply) = reply_for(&msg.message_chain.to_text(), info) {
        bot.send_group_message(msg.group(), reply, msg.message_chain.message_id())
            .await
            .or_log("group command")?;
    }
    Ok(())
}

async fn friend_commands(bot: Arc<MiraiBot>, msg: FriendMessage) -> ApiResult<()> {
    let info = || {
        format!(
            "From: {} ({})\nMessage id: {}",
            msg.sender.nickname,
            msg.sender.id,
            msg.message_chain.message_id().unwrap_or_default(),
        )
    };
    if let Some(reply) = reply_for(&msg.message_chain.to_text(), info) {
        bot.send_friend_message(&msg.sender, reply, None)
            .await
            .or_log("friend command")?;
    }
    Ok(())
}

async fn nudge_back(bot: Arc<MiraiBot>, nudge: NudgeEvent) -> ApiResult<()> {
    if nudge.target != bot.account() || nudge.subject.kind == SubjectKind::Stranger {
        return Ok(());
    }
    bot.send_nudge(nudge.from_id, nudge.subject, nudge.subject.kind)
        .await
        .or_log("nudge back")?;
    Ok(())
}

async fn accept_friend(bot: Arc<MiraiBot>, request: NewFriendRequestEvent) -> ApiResult<()> {
    info!(from = request.from_id, nick = %request.nick, "Accepting friend request");
    bot.respond_friend_request(&request, FriendRequestOperation::Accept, "")
        .await
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = MiraiRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    runtime
        .register_sync(["GroupMessage", "FriendMessage", "TempMessage"], log_message)
        .register("GroupMessage", group_commands)
        .register("FriendMessage", friend_commands)
        .register("NudgeEvent", nudge_back)
        .register("NewFriendRequestEvent", accept_friend);

    info!(listeners = runtime.listener_count(), "Listeners registered");

    runtime.run().await?;

    Ok(())
}
