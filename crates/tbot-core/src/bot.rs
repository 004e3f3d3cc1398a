//! Wires the services together and handles transport events.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, warn};

use crate::{
    auth::{AuthService, AuthSettings},
    commands::CommandInterpreter,
    directory::UserDirectoryCache,
    domain::UserId,
    errors::Error,
    fanout::TranslationFanout,
    language::{IsoLanguages, LanguagePreferences},
    messaging::{
        port::{IdentityKeys, MessageSender},
        types::TransportEvent,
    },
    ports::{Directory, LanguageCodes, Translator, WordSource},
    router::{BotIdentity, MessageRouter, Route},
    store::{Storage, KEY_ADDR, NS_STATE},
    Result,
};

/// Collaborators the bot is built from.
pub struct BotDeps {
    pub storage: Storage,
    /// Uncached directory client; the bot puts its own cache in front.
    pub directory: Arc<dyn Directory>,
    pub translator: Arc<dyn Translator>,
    pub sender: Arc<dyn MessageSender>,
    pub keys: Arc<dyn IdentityKeys>,
    pub words: Arc<dyn WordSource>,
    pub codes: Arc<dyn LanguageCodes>,
    pub auth: AuthSettings,
    pub directory_ttl: Duration,
}

impl BotDeps {
    pub fn new(
        storage: Storage,
        directory: Arc<dyn Directory>,
        translator: Arc<dyn Translator>,
        sender: Arc<dyn MessageSender>,
        keys: Arc<dyn IdentityKeys>,
        words: Arc<dyn WordSource>,
    ) -> Self {
        Self {
            storage,
            directory,
            translator,
            sender,
            keys,
            words,
            codes: Arc::new(IsoLanguages),
            auth: AuthSettings::default(),
            directory_ttl: crate::directory::DEFAULT_DIRECTORY_TTL,
        }
    }
}

pub struct Bot {
    router: MessageRouter,
    auth: AuthService,
    keys: Arc<dyn IdentityKeys>,
}

impl Bot {
    /// Build the bot for the registered address in `state/addr`.
    ///
    /// Returns `Ok(None)` when no address has been registered yet.
    pub async fn start(deps: BotDeps) -> Result<Option<Self>> {
        let Some(addr) = deps.storage.get::<UserId>(NS_STATE, KEY_ADDR).await? else {
            warn!("bot is not yet registered");
            return Ok(None);
        };
        info!(addr = %addr, "starting message receiver");

        let directory: Arc<dyn Directory> =
            Arc::new(UserDirectoryCache::new(deps.directory, deps.directory_ttl));

        let me = directory
            .get_users(std::slice::from_ref(&addr))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Config(format!("bot user {addr} not found in directory")))?;
        let identity = BotIdentity {
            id: addr,
            tag_slug: me.tag.slug,
        };

        let prefs = LanguagePreferences::new(deps.storage.clone());
        let commands = CommandInterpreter::new(
            prefs.clone(),
            deps.codes,
            deps.translator.clone(),
            deps.sender.clone(),
        );
        let fanout = TranslationFanout::new(
            directory.clone(),
            prefs,
            deps.translator,
            deps.sender.clone(),
        );
        let router = MessageRouter::new(identity, directory.clone(), commands, fanout);
        let auth = AuthService::new(deps.storage, directory, deps.sender, deps.words, deps.auth);

        Ok(Some(Self {
            router,
            auth,
            keys: deps.keys,
        }))
    }

    pub fn identity(&self) -> &BotIdentity {
        self.router.identity()
    }

    /// Login and administrator operations, for the web layer.
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Handle one inbound event. Failures are logged, never returned, so one bad
    /// message cannot stop the receive loop.
    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message { data } => {
                match self.router.handle_body(&data.message.body).await {
                    Ok(Route::Ignored(reason)) => debug!(?reason, "message ignored"),
                    Ok(route) => debug!(?route, "message handled"),
                    Err(Error::Envelope(reason)) => {
                        error!(%reason, "message contained no supported message payload type")
                    }
                    Err(e) => error!(error = %e, "message handling failed"),
                }
            }
            TransportEvent::KeyChange { addr } => {
                warn!(addr = %addr, "auto-accepting new identity key");
                if let Err(e) = self.keys.accept_identity_key(&addr).await {
                    error!(addr = %addr, error = %e, "failed to accept identity key");
                }
            }
            TransportEvent::Error { message } => {
                error!(%message, "message receiver error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::HELP_REPLY,
        store::MemoryStore,
        testing::{FakeDirectory, FakeTranslator, FixedWords, RecordingSender},
    };

    struct Setup {
        storage: Storage,
        sender: Arc<RecordingSender>,
        directory: Arc<FakeDirectory>,
    }

    fn setup() -> Setup {
        Setup {
            storage: Storage::new(Arc::new(MemoryStore::new())),
            sender: Arc::new(RecordingSender::new()),
            directory: Arc::new(
                FakeDirectory::new()
                    .with_user("bot", "translator", "Bot")
                    .with_user("u1", "ann", "Ann"),
            ),
        }
    }

    fn deps(s: &Setup) -> BotDeps {
        BotDeps::new(
            s.storage.clone(),
            s.directory.clone(),
            Arc::new(FakeTranslator::new()),
            s.sender.clone(),
            s.sender.clone(),
            Arc::new(FixedWords),
        )
    }

    fn message(sender: &str, text: &str) -> TransportEvent {
        let body = serde_json::json!([{
            "version": 1,
            "messageType": "content",
            "threadId": "t1",
            "messageId": "m1",
            "sender": {"userId": sender},
            "distribution": {"expression": "@ann:acme + @translator:acme"},
            "data": {"body": [{"type": "text/plain", "value": text}]}
        }]);
        TransportEvent::message(body.to_string())
    }

    #[tokio::test]
    async fn unregistered_bot_does_not_start() {
        let s = setup();
        assert!(Bot::start(deps(&s)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn registered_bot_learns_its_tag() {
        let s = setup();
        s.storage.set(NS_STATE, KEY_ADDR, "bot").await.unwrap();
        let bot = Bot::start(deps(&s)).await.unwrap().unwrap();
        assert_eq!(bot.identity().tag_slug, "translator");
        assert_eq!(bot.identity().mention(), "@translator");
    }

    #[tokio::test]
    async fn missing_bot_user_is_a_config_error() {
        let s = setup();
        s.storage.set(NS_STATE, KEY_ADDR, "ghost").await.unwrap();
        assert!(matches!(Bot::start(deps(&s)).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn events_are_dispatched() {
        let s = setup();
        s.storage.set(NS_STATE, KEY_ADDR, "bot").await.unwrap();
        let bot = Bot::start(deps(&s)).await.unwrap().unwrap();

        bot.handle_event(message("u1", "@translator help")).await;
        bot.handle_event(TransportEvent::message("not a payload".to_string()))
            .await;
        bot.handle_event(TransportEvent::KeyChange {
            addr: "u1".to_string(),
        })
        .await;
        bot.handle_event(TransportEvent::Error {
            message: "socket closed".to_string(),
        })
        .await;

        assert_eq!(s.sender.texts(), vec![HELP_REPLY.to_string()]);
        assert_eq!(s.sender.accepted_keys(), vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn directory_lookups_are_cached() {
        let s = setup();
        s.storage.set(NS_STATE, KEY_ADDR, "bot").await.unwrap();
        let bot = Bot::start(deps(&s)).await.unwrap().unwrap();

        bot.handle_event(message("u1", "@translator help")).await;
        bot.handle_event(message("u1", "@translator help")).await;
        assert_eq!(s.directory.resolve_calls(), 1);
        assert_eq!(s.sender.sent().len(), 2);
    }
}
