//! Inbound message classification and dispatch.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    commands::{first_token, CommandInterpreter},
    domain::UserId,
    envelope::{parse_body, Payload},
    fanout::TranslationFanout,
    messaging::types::ReplyTarget,
    ports::Directory,
    Result,
};

/// The bot's own identity, used to drop self-messages and detect mentions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    pub tag_slug: String,
}

impl BotIdentity {
    /// `@slug`, as typed at the start of a command.
    pub fn mention(&self) -> String {
        format!("@{}", self.tag_slug)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    Control,
    OwnMessage,
    NoText,
    NoRecipients,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Ignored(IgnoreReason),
    Command,
    Translatable,
}

/// Decide what to do with a payload. Pure; no collaborator calls.
pub fn classify(payload: &Payload, me: &BotIdentity) -> Route {
    if payload.is_control() {
        return Route::Ignored(IgnoreReason::Control);
    }
    let Some(text) = payload.text() else {
        return Route::Ignored(IgnoreReason::NoText);
    };
    if payload.sender.user_id == me.id {
        return Route::Ignored(IgnoreReason::OwnMessage);
    }

    let mentioned = payload.data.mentions.iter().any(|m| m == &me.id)
        || first_token(text) == me.mention();
    if mentioned {
        Route::Command
    } else {
        Route::Translatable
    }
}

pub struct MessageRouter {
    me: BotIdentity,
    directory: Arc<dyn Directory>,
    commands: CommandInterpreter,
    fanout: TranslationFanout,
}

impl MessageRouter {
    pub fn new(
        me: BotIdentity,
        directory: Arc<dyn Directory>,
        commands: CommandInterpreter,
        fanout: TranslationFanout,
    ) -> Self {
        Self {
            me,
            directory,
            commands,
            fanout,
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.me
    }

    /// Parse a transport message body and dispatch it.
    ///
    /// Unsupported envelopes come back as [`crate::Error::Envelope`]; the caller
    /// logs and drops them.
    pub async fn handle_body(&self, body: &str) -> Result<Route> {
        let payload = parse_body(body)?;
        self.dispatch(&payload).await
    }

    pub async fn dispatch(&self, payload: &Payload) -> Result<Route> {
        let route = classify(payload, &self.me);
        let Some(text) = payload.text() else {
            debug!(?route, "payload ignored");
            return Ok(route);
        };
        if let Route::Ignored(reason) = route {
            debug!(?reason, "payload ignored");
            return Ok(route);
        }

        let distribution = self
            .directory
            .resolve_tags(&payload.distribution.expression)
            .await?;
        let target = ReplyTarget {
            distribution,
            thread_id: payload.thread_id.clone(),
            message_id: payload.message_id.clone(),
        };

        match route {
            Route::Command => {
                self.commands
                    .execute(&target, &payload.sender.user_id, text)
                    .await?;
            }
            Route::Translatable => {
                if target.distribution.userids.is_empty() {
                    warn!(
                        expression = %payload.distribution.expression,
                        "distribution resolved to no recipients"
                    );
                    return Ok(Route::Ignored(IgnoreReason::NoRecipients));
                }
                self.fanout.fan_out(&target, text).await?;
            }
            Route::Ignored(_) => {}
        }
        Ok(route)
    }
}
