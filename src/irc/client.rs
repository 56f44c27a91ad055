use crate::commands::Command;
use crate::config::IrcSettings;
use crate::error::{CtrlBotError, Result};
use crate::irc::Message;
use crate::state::AppState;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::{Framed, LinesCodec};

const MAX_LINE_LENGTH: usize = 8192;

/// Reacts to server lines for one connection.
pub struct Session {
    state: Arc<AppState>,
    outgoing: UnboundedSender<Message>,
    nick: String,
}

impl Session {
    pub fn new(state: Arc<AppState>, outgoing: UnboundedSender<Message>) -> Self {
        let nick = state.config().irc.nick.clone();
        state.set_connection(outgoing.clone());
        Self {
            state,
            outgoing,
            nick,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    fn send(&self, message: Message) -> Result<()> {
        self.outgoing
            .send(message)
            .map_err(|_| CtrlBotError::Irc("connection writer has stopped".into()))
    }

    /// `PASS`, `NICK` and `USER`.
    pub fn register(&self) -> Result<()> {
        let irc = &self.state.config().irc;
        if let Some(password) = &irc.password {
            self.send(Message::pass(password))?;
        }
        self.send(Message::nick_cmd(&self.nick))?;
        self.send(Message::user(&irc.username, &irc.realname))
    }

    pub fn handle(&mut self, message: Message) -> Result<()> {
        match message.command.as_str() {
            "PING" => self.send(Message::pong(message.param(0).unwrap_or_default())),
            // RPL_WELCOME
            "001" => {
                if let Some(nick) = message.param(0) {
                    self.nick = nick.to_string();
                }
                log::info!("Registered as {}", self.nick);
                for channel in &self.state.config().irc.channels {
                    self.send(Message::join(channel))?;
                }
                Ok(())
            }
            // ERR_NICKNAMEINUSE
            "433" => {
                self.nick.push('_');
                log::warn!("Nick in use, trying {}", self.nick);
                self.send(Message::nick_cmd(&self.nick))
            }
            "JOIN" => {
                if message.nick() == Some(self.nick.as_str()) {
                    if let Some(channel) = message.param(0) {
                        self.state.on_joined(channel, &self.outgoing);
                    }
                }
                Ok(())
            }
            "PRIVMSG" => {
                self.on_privmsg(&message);
                Ok(())
            }
            "ERROR" => Err(CtrlBotError::Irc(format!(
                "server closed the link: {}",
                message.param(0).unwrap_or_default()
            ))),
            _ => Ok(()),
        }
    }

    fn on_privmsg(&self, message: &Message) {
        let (Some(sender), Some(target), Some(text)) =
            (message.nick(), message.param(0), message.param(1))
        else {
            return;
        };
        let prefix = &self.state.config().irc.command_prefix;
        let command = match Command::parse(text, prefix) {
            None => return,
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                let reply = Message::privmsg(reply_target(sender, target), &e.to_string());
                let _ = self.outgoing.send(reply);
                return;
            }
        };
        log::debug!("{} in {}: {:?}", sender, target, command);

        let reply_to = reply_target(sender, target).to_string();
        let state = self.state.clone();
        let outgoing = self.outgoing.clone();
        tokio::spawn(async move {
            for line in state.run_command(&command).await {
                if outgoing.send(Message::privmsg(&reply_to, &line)).is_err() {
                    break;
                }
            }
        });
    }
}

/// Channel messages are answered in the channel, private ones to the sender.
fn reply_target<'a>(sender: &'a str, target: &'a str) -> &'a str {
    if target.starts_with(['#', '&', '+', '!']) {
        target
    } else {
        sender
    }
}

/// Connect, serve until the link drops, and reconnect forever.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let irc = state.config().irc.clone();
    loop {
        match connect_once(state.clone(), &irc).await {
            Ok(()) => log::warn!("Connection to {} closed", irc.server),
            Err(e) => log::error!("Connection to {} failed: {}", irc.server, e),
        }
        let delay = Duration::from_secs(irc.reconnect_delay_secs);
        log::info!("Reconnecting in {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

async fn connect_once(state: Arc<AppState>, irc: &IrcSettings) -> Result<()> {
    log::info!("Connecting to {}:{}", irc.server, irc.port);
    let stream = TcpStream::connect((irc.server.as_str(), irc.port)).await?;
    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            log::trace!(">> {}", message);
            // LinesCodec only appends '\n'.
            if let Err(e) = sink.send(format!("{}\r", message)).await {
                log::error!("Failed to write to server: {}", e);
                break;
            }
        }
    });

    let mut session = Session::new(state, tx);
    session.register()?;

    let result = async {
        while let Some(line) = lines.next().await {
            let line = line?;
            log::trace!("<< {}", line);
            match Message::parse(&line) {
                Ok(message) => session.handle(message)?,
                Err(e) => log::debug!("Skipping line: {}", e),
            }
        }
        Ok::<(), CtrlBotError>(())
    }
    .await;

    writer.abort();
    result
}
