//! Line protocol definitions
//!
//! Newline-delimited text frames in both directions. Inbound lines are parsed
//! into a [`Message`]; outbound lines are built as [`ServerLine`] and rendered
//! through `Display` by the connection's writer task.

use std::fmt;

use crate::types::ClientName;

/// Prefix marking a directed message
pub const DIRECTED_PREFIX: &str = "TO:";

/// Client → Server chat message
///
/// Built from exactly one inbound line once the handshake is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Deliver to every registered client, sender included
    Broadcast { body: String },
    /// Deliver to the listed recipients, in order, duplicates included
    Directed {
        recipients: Vec<String>,
        body: String,
    },
}

impl Message {
    /// Parse one inbound line
    ///
    /// Returns `None` for a directed line with fewer than three `:`-separated
    /// parts. Such lines are dropped without telling the sender.
    pub fn parse(line: &str) -> Option<Self> {
        if !line.starts_with(DIRECTED_PREFIX) {
            return Some(Message::Broadcast {
                body: line.to_string(),
            });
        }

        let mut parts = line.splitn(3, ':');
        let _prefix = parts.next()?;
        let recipients = parts.next()?;
        let body = parts.next()?;

        let recipients = recipients
            .split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Some(Message::Directed {
            recipients,
            body: body.to_string(),
        })
    }
}

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Ask the client for a screen name
    SubmitName,
    /// The proposed name was registered
    NameAccepted,
    /// Chat message to render
    Message { from: ClientName, body: String },
    /// Full roster of registered names
    ClientList(Vec<ClientName>),
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::SubmitName => f.write_str("SUBMITNAME"),
            ServerLine::NameAccepted => f.write_str("NAMEACCEPTED"),
            ServerLine::Message { from, body } => write!(f, "MESSAGE {}: {}", from, body),
            ServerLine::ClientList(names) => {
                // Every name carries a trailing comma; commas inside names are not escaped.
                f.write_str("CLIENTLIST")?;
                for name in names {
                    write!(f, "{},", name)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> ClientName {
        ClientName::parse(raw).unwrap()
    }

    #[test]
    fn test_plain_line_is_broadcast() {
        assert_eq!(
            Message::parse("hello: world"),
            Some(Message::Broadcast {
                body: "hello: world".to_string()
            })
        );
    }

    #[test]
    fn test_directed_keeps_colons_in_body() {
        let msg = Message::parse("TO:alice,bob:see you at 10:30").unwrap();
        assert_eq!(
            msg,
            Message::Directed {
                recipients: vec!["alice".to_string(), "bob".to_string()],
                body: "see you at 10:30".to_string(),
            }
        );
    }

    #[test]
    fn test_directed_skips_empty_recipients_keeps_duplicates() {
        let msg = Message::parse("TO:,alice,,alice,:hi").unwrap();
        match msg {
            Message::Directed { recipients, body } => {
                assert_eq!(recipients, vec!["alice", "alice"]);
                assert_eq!(body, "hi");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_directed_with_too_few_parts_is_dropped() {
        assert_eq!(Message::parse("TO:alice"), None);
        assert_eq!(Message::parse("TO:"), None);
    }

    #[test]
    fn test_directed_empty_body_is_valid() {
        assert_eq!(
            Message::parse("TO:alice:"),
            Some(Message::Directed {
                recipients: vec!["alice".to_string()],
                body: String::new(),
            })
        );
    }

    #[test]
    fn test_lowercase_prefix_is_broadcast() {
        assert!(matches!(
            Message::parse("to:alice:hi"),
            Some(Message::Broadcast { .. })
        ));
    }

    #[test]
    fn test_server_line_rendering() {
        assert_eq!(ServerLine::SubmitName.to_string(), "SUBMITNAME");
        assert_eq!(ServerLine::NameAccepted.to_string(), "NAMEACCEPTED");
        assert_eq!(
            ServerLine::Message {
                from: name("alice"),
                body: "hi".to_string()
            }
            .to_string(),
            "MESSAGE alice: hi"
        );
    }

    #[test]
    fn test_client_list_trailing_comma() {
        let line = ServerLine::ClientList(vec![name("alice"), name("bob")]);
        assert_eq!(line.to_string(), "CLIENTLISTalice,bob,");
        assert_eq!(ServerLine::ClientList(Vec::new()).to_string(), "CLIENTLIST");
    }
}
