//! Line-delimited JSON transport over stdio.
//!
//! Inbound: one [`TransportEvent`] per line. Outbound: one frame per line,
//! either `{"type":"send", ...message}` or `{"type":"accept_key","addr":...}`.

use async_trait::async_trait;
use serde::Serialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tbot_core::{
    bot::Bot,
    messaging::{
        port::{IdentityKeys, MessageSender},
        types::{OutgoingMessage, TransportEvent},
    },
    Result,
};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Frame<'a> {
    Send(&'a OutgoingMessage),
    AcceptKey { addr: &'a str },
}

pub struct PipeTransport<W> {
    out: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> PipeTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    async fn write_frame(&self, frame: &Frame<'_>) -> Result<()> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');

        // One lock per frame keeps concurrent writers from interleaving lines.
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }

    #[cfg(test)]
    async fn written(&self) -> W
    where
        W: Clone,
    {
        self.out.lock().await.clone()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSender for PipeTransport<W> {
    async fn send(&self, msg: OutgoingMessage) -> Result<()> {
        self.write_frame(&Frame::Send(&msg)).await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> IdentityKeys for PipeTransport<W> {
    async fn accept_identity_key(&self, addr: &str) -> Result<()> {
        self.write_frame(&Frame::AcceptKey { addr }).await
    }
}

/// Parse one inbound line. Blank lines yield `None`.
fn parse_line(line: &str) -> Option<std::result::Result<TransportEvent, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Feed inbound events to the bot until EOF or cancellation.
///
/// Events are handled one at a time, in arrival order. Lines that are not
/// UTF-8 or not a known event are logged and skipped.
pub async fn run<R>(bot: &Bot, reader: R, cancel: CancellationToken) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut segments = reader.split(b'\n');

    loop {
        let segment = tokio::select! {
          _ = cancel.cancelled() => {
            info!("receiver cancelled");
            break;
          }
          segment = segments.next_segment() => segment?,
        };
        let Some(raw) = segment else {
            info!("transport closed");
            break;
        };
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "transport line is not utf-8");
                continue;
            }
        };
        match parse_line(&line) {
            None => {}
            Some(Ok(event)) => bot.handle_event(event).await,
            Some(Err(e)) => warn!(error = %e, "unparseable transport event"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tbot_core::{
        bot::BotDeps,
        domain::{Distribution, MessageId, Slug, ThreadId, User, UserId},
        ports::{Directory, Translator},
        store::{MemoryStore, Storage, KEY_ADDR, NS_STATE},
        words::RandomWords,
    };
    use tokio::io::BufReader;

    struct StaticDirectory(Vec<User>);

    #[async_trait]
    impl Directory for StaticDirectory {
        async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
            Ok(ids
                .iter()
                .filter_map(|id| self.0.iter().find(|u| &u.id == id).cloned())
                .collect())
        }

        async fn resolve_tags(&self, expression: &str) -> Result<Distribution> {
            let userids = expression
                .split('+')
                .map(str::trim)
                .filter_map(|t| self.0.iter().find(|u| u.fq_tag() == t))
                .map(|u| u.id.clone())
                .collect();
            Ok(Distribution {
                userids,
                ..Default::default()
            })
        }
    }

    struct TaggingTranslator;

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(&self, text: &str, target: &str) -> Result<String> {
            Ok(format!("[{target}] {text}"))
        }
    }

    fn user(id: &str, tag: &str) -> User {
        User {
            id: UserId::from(id),
            tag: Slug {
                slug: tag.to_string(),
            },
            org: Slug {
                slug: "acme".to_string(),
            },
            first_name: Some(tag.to_string()),
            middle_name: None,
            last_name: None,
        }
    }

    async fn bot_with_pipe() -> (Bot, Arc<PipeTransport<Vec<u8>>>) {
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        storage.set(NS_STATE, KEY_ADDR, "bot").await.unwrap();
        let directory = Arc::new(StaticDirectory(vec![
            user("bot", "bot"),
            user("u1", "ann"),
            user("u2", "bob"),
        ]));
        let pipe = Arc::new(PipeTransport::new(Vec::<u8>::new()));
        let deps = BotDeps::new(
            storage,
            directory,
            Arc::new(TaggingTranslator),
            pipe.clone(),
            pipe.clone(),
            Arc::new(RandomWords),
        );
        let bot = Bot::start(deps).await.unwrap().unwrap();
        (bot, pipe)
    }

    fn message_line(sender: &str, message_id: &str, text: &str) -> String {
        let body = serde_json::json!([{
            "version": 1,
            "messageType": "content",
            "threadId": "t1",
            "messageId": message_id,
            "sender": {"userId": sender},
            "distribution": {"expression": "@ann:acme + @bob:acme"},
            "data": {"body": [{"type": "text/plain", "value": text}]}
        }]);
        let event = TransportEvent::message(body.to_string());
        format!("{}\n", serde_json::to_string(&event).unwrap())
    }

    async fn frames(pipe: &PipeTransport<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(pipe.written().await)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn frames_are_json_lines() {
        let pipe = PipeTransport::new(Vec::<u8>::new());
        let dist = Distribution {
            userids: vec![UserId::from("u1")],
            ..Default::default()
        };
        let msg = OutgoingMessage::text(dist, ThreadId("t1".to_string()), "hi")
            .reply_to(MessageId("m1".to_string()));
        pipe.send(msg).await.unwrap();
        pipe.accept_identity_key("u9").await.unwrap();

        let out = String::from_utf8(pipe.written().await).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "send");
        assert_eq!(lines[0]["threadId"], "t1");
        assert_eq!(lines[0]["messageRef"], "m1");
        assert_eq!(lines[0]["text"], "hi");
        assert_eq!(lines[0]["distribution"]["userids"][0], "u1");
        assert_eq!(lines[1], serde_json::json!({"type": "accept_key", "addr": "u9"}));
    }

    #[test]
    fn inbound_lines() {
        assert!(parse_line("   ").is_none());
        assert!(matches!(parse_line("{oops"), Some(Err(_))));

        let event = parse_line(r#"{"type":"keychange","addr":"u2"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            TransportEvent::KeyChange {
                addr: "u2".to_string()
            }
        );

        let event = parse_line(r#"{"type":"message","data":{"message":{"body":"[]"}}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, TransportEvent::message("[]"));
    }

    #[tokio::test]
    async fn bad_lines_are_skipped_and_later_events_handled() {
        let (bot, pipe) = bot_with_pipe().await;

        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(b"{oops\n\n");
        input.extend_from_slice(message_line("u1", "m1", "@bot help").as_bytes());
        input.extend_from_slice(b"{\"type\":\"keychange\",\"addr\":\"u2\"}\n");

        run(&bot, BufReader::new(&input[..]), CancellationToken::new())
            .await
            .unwrap();

        let out = frames(&pipe).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["type"], "send");
        assert!(out[0]["text"].as_str().unwrap().starts_with("Command list:"));
        assert_eq!(out[1], serde_json::json!({"type": "accept_key", "addr": "u2"}));
    }

    #[tokio::test]
    async fn events_are_handled_in_arrival_order() {
        let (bot, pipe) = bot_with_pipe().await;

        let mut input = message_line("u1", "m1", "@bot language fr");
        input.push_str(&message_line("u2", "m2", "hello"));

        run(&bot, BufReader::new(input.as_bytes()), CancellationToken::new())
            .await
            .unwrap();

        let out = frames(&pipe).await;
        let texts: Vec<&str> = out.iter().map(|f| f["text"].as_str().unwrap()).collect();
        assert_eq!(
            texts,
            vec!["[fr] Okay. I have set your preferred language to fr", "[fr] hello"]
        );
        assert_eq!(out[1]["messageRef"], "m2");
    }

    #[tokio::test]
    async fn empty_input_ends_the_loop() {
        let (bot, pipe) = bot_with_pipe().await;
        run(&bot, BufReader::new(&b""[..]), CancellationToken::new())
            .await
            .unwrap();
        assert!(frames(&pipe).await.is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_an_idle_loop() {
        let (bot, _pipe) = bot_with_pipe().await;
        // The writer half stays open, so the reader never sees EOF.
        let (_writer, reader) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run(&bot, BufReader::new(reader), cancel),
        )
        .await
        .expect("loop exits after cancellation")
        .unwrap();
    }
}
