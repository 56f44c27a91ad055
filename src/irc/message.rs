use crate::error::{CtrlBotError, Result};
use std::fmt;

/// One IRC protocol line (RFC 1459 framing, IRCv3 tags skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn new(command: &str, params: &[&str]) -> Self {
        Self {
            prefix: None,
            command: command.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn parse(line: &str) -> Result<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map_or("", |(_, r)| r);
        }
        rest = rest.trim_start();

        let mut prefix = None;
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (p, r) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
            prefix = Some(p.to_string());
            rest = r.trim_start();
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(CtrlBotError::Irc(format!("no command in line {:?}", line)));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split(['!', '@']).next().unwrap_or(prefix))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn pass(password: &str) -> Self {
        Self::new("PASS", &[password])
    }

    pub fn nick_cmd(nick: &str) -> Self {
        Self::new("NICK", &[nick])
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self::new("USER", &[username, "0", "*", realname])
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", &[channel])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", &[token])
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", &[target, text])
    }

    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", &[reason])
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;
        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_prefix_and_trailing() {
        let msg = Message::parse(":alice!al@example.org PRIVMSG #plays :!fire LR 300\r\n").unwrap();
        assert_eq!(msg.nick(), Some("alice"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#plays", "!fire LR 300"]);
    }

    #[test]
    fn parses_numeric_and_ping() {
        let welcome = Message::parse(":irc.example.org 001 ctrlbot :Welcome").unwrap();
        assert_eq!(welcome.command, "001");
        assert_eq!(welcome.param(0), Some("ctrlbot"));

        let ping = Message::parse("PING :abc123").unwrap();
        assert_eq!(ping.prefix, None);
        assert_eq!(ping.params, vec!["abc123"]);
    }

    #[test]
    fn skips_tags() {
        let msg = Message::parse("@time=2024-01-01T00:00:00Z :bob JOIN #plays").unwrap();
        assert_eq!(msg.nick(), Some("bob"));
        assert_eq!(msg.params, vec!["#plays"]);
    }

    #[test]
    fn empty_line_is_an_error() {
        assert!(Message::parse("").is_err());
        assert!(Message::parse(":only.prefix").is_err());
    }

    #[test]
    fn serializes_trailing_when_needed() {
        assert_eq!(
            Message::privmsg("#plays", "Type !help").to_string(),
            "PRIVMSG #plays :Type !help"
        );
        assert_eq!(Message::join("#plays").to_string(), "JOIN #plays");
        assert_eq!(
            Message::user("ctrlbot", "ctrl bot").to_string(),
            "USER ctrlbot 0 * :ctrl bot"
        );
    }
}
