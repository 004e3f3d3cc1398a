use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::{
    domain::UserId,
    language::{normalize_language, LanguagePreferences},
    messaging::{port::MessageSender, types::ReplyTarget},
    ports::{LanguageCodes, Translator},
    Result,
};

pub const HELP_REPLY: &str = "Command list:\n\
help - lists my commands\n\
language [language] - sets your preferred language to the specified language";

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Split on whitespace runs.
///
/// Leading and trailing empty pieces are kept: mention insertion can put a
/// non-space whitespace character at the front, and that must shift the
/// command position rather than vanish.
pub fn tokenize(text: &str) -> Vec<&str> {
    whitespace_re().split(text).collect()
}

/// First whitespace-delimited token (empty if the text starts with whitespace).
pub fn first_token(text: &str) -> &str {
    whitespace_re().split(text).next().unwrap_or("")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Language(Option<String>),
    Help,
    Unknown(String),
}

/// Parse a mention-prefixed command: token 1 is the command, token 2 its argument.
pub fn parse(text: &str) -> Option<Command> {
    let tokens = tokenize(text);
    let name = *tokens.get(1)?;
    let arg = tokens
        .get(2)
        .copied()
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(match name {
        "language" => Command::Language(arg),
        "help" => Command::Help,
        other => Command::Unknown(other.to_string()),
    })
}

pub struct CommandInterpreter {
    prefs: LanguagePreferences,
    codes: Arc<dyn LanguageCodes>,
    translator: Arc<dyn Translator>,
    sender: Arc<dyn MessageSender>,
}

impl CommandInterpreter {
    pub fn new(
        prefs: LanguagePreferences,
        codes: Arc<dyn LanguageCodes>,
        translator: Arc<dyn Translator>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            prefs,
            codes,
            translator,
            sender,
        }
    }

    /// Run the command in `text`. Unrecognized commands are ignored.
    pub async fn execute(&self, target: &ReplyTarget, sender_id: &UserId, text: &str) -> Result<()> {
        match parse(text) {
            Some(Command::Language(Some(raw))) => self.set_language(target, sender_id, &raw).await,
            Some(Command::Language(None)) => {
                debug!(user = %sender_id, "language command without an argument");
                Ok(())
            }
            Some(Command::Help) => self.sender.send(target.reply(HELP_REPLY)).await,
            Some(Command::Unknown(name)) => {
                debug!(command = %name, "ignoring unknown command");
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn set_language(&self, target: &ReplyTarget, sender_id: &UserId, raw: &str) -> Result<()> {
        let language = normalize_language(raw, self.codes.as_ref());
        self.prefs.set(sender_id, &language).await?;
        info!(user = %sender_id, language = %language, "language preference set");

        let confirmation = format!("Okay. I have set your preferred language to {language}");
        let translated = self.translator.translate(&confirmation, &language).await?;
        self.sender.send(target.reply(translated)).await
    }
}
