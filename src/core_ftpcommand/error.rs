use std::io;

/// Short-circuit result for command handlers.
///
/// `Reply` carries a protocol reply line (without CRLF) that the dispatch
/// loop writes before reading the next command; the session continues. `Io`
/// is fatal to the session and turns into a final `421`.
#[derive(Debug)]
pub enum CommandError {
    Reply(String),
    Io(io::Error),
}

impl CommandError {
    pub fn reply(line: impl Into<String>) -> Self {
        CommandError::Reply(line.into())
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::Io(err)
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Reply(line) => write!(f, "reply: {}", line),
            CommandError::Io(err) => write!(f, "io: {}", err),
        }
    }
}
