use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tbot_atlas::AtlasClient;
use tbot_core::{
    auth::AuthSettings,
    bot::{Bot, BotDeps},
    config::Config,
    store::{JsonFileStore, Storage},
    words::RandomWords,
};
use tbot_translate::GoogleTranslator;

mod pipe;

use pipe::PipeTransport;

#[tokio::main]
async fn main() -> Result<(), tbot_core::Error> {
    tbot_core::logging::init("tbot")?;

    let cfg = Config::load()?;

    let storage = Storage::new(Arc::new(JsonFileStore::open(cfg.state_file.clone()).await?));
    let transport = Arc::new(PipeTransport::new(tokio::io::stdout()));
    let directory = Arc::new(AtlasClient::new(
        cfg.atlas_url.clone(),
        cfg.atlas_token.clone(),
        cfg.http_timeout,
    )?);
    let translator = Arc::new(GoogleTranslator::new(
        cfg.google_api_key.clone(),
        cfg.google_project_id.clone(),
        cfg.http_timeout,
    )?);

    let mut deps = BotDeps::new(
        storage,
        directory,
        translator,
        transport.clone(),
        transport,
        Arc::new(RandomWords),
    );
    deps.auth = AuthSettings::from(&cfg);
    deps.directory_ttl = cfg.directory_cache_ttl;

    let Some(bot) = Bot::start(deps).await? else {
        return Ok(());
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
        });
    }

    pipe::run(&bot, BufReader::new(tokio::io::stdin()), cancel).await
}
