//! One translated reply per distinct language among a message's recipients.

use std::{collections::BTreeSet, sync::Arc};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    domain::Distribution,
    language::LanguagePreferences,
    messaging::{port::MessageSender, types::ReplyTarget},
    ports::{Directory, Translator},
    Result,
};

pub struct TranslationFanout {
    directory: Arc<dyn Directory>,
    prefs: LanguagePreferences,
    translator: Arc<dyn Translator>,
    sender: Arc<dyn MessageSender>,
}

/// A translation that only echoes the input (same language, code, names).
pub fn is_noop_translation(original: &str, translated: &str) -> bool {
    original.trim() == translated.trim()
}

impl TranslationFanout {
    pub fn new(
        directory: Arc<dyn Directory>,
        prefs: LanguagePreferences,
        translator: Arc<dyn Translator>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            directory,
            prefs,
            translator,
            sender,
        }
    }

    /// Distinct preferred languages of the distribution's recipients.
    ///
    /// Recipients without a stored preference contribute nothing.
    pub async fn target_languages(&self, distribution: &Distribution) -> Result<BTreeSet<String>> {
        let recipients = self.directory.get_users(&distribution.userids).await?;
        let mut languages = BTreeSet::new();
        for user in &recipients {
            if let Some(lang) = self.prefs.get(&user.id).await? {
                languages.insert(lang);
            }
        }
        Ok(languages)
    }

    /// Translate `text` once per target language and reply to the whole distribution.
    ///
    /// Languages are handled concurrently and independently; a failure in one
    /// is logged and does not affect the others. Returns how many replies were sent.
    pub async fn fan_out(&self, target: &ReplyTarget, text: &str) -> Result<usize> {
        let languages = self.target_languages(&target.distribution).await?;
        if languages.is_empty() {
            debug!("no recipient language preferences; nothing to translate");
            return Ok(0);
        }

        let mut tasks = JoinSet::new();
        for lang in languages {
            let translator = self.translator.clone();
            let sender = self.sender.clone();
            let target = target.clone();
            let text = text.to_string();
            tasks.spawn(async move {
                let translated = translator.translate(&text, &lang).await?;
                if is_noop_translation(&text, &translated) {
                    debug!(lang = %lang, "translation is a no-op; suppressed");
                    return Ok::<_, crate::Error>((lang, false));
                }
                sender.send(target.reply(translated)).await?;
                Ok::<_, crate::Error>((lang, true))
            });
        }

        let mut sent = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((_, true))) => sent += 1,
                Ok(Ok((_, false))) => {}
                Ok(Err(e)) => warn!(error = %e, "translated reply failed"),
                Err(e) => warn!(error = %e, "translation task aborted"),
            }
        }
        Ok(sent)
    }
}
