// src/constants.rs

/// How long the server waits for the client to connect to a passive listener.
pub const DATA_ACCEPT_TIMEOUT_SECS: u64 = 15;

/// Per-operation deadline on an accepted data socket.
pub const DATA_IO_TIMEOUT_SECS: u64 = 15;

/// Copy buffer for LIST/RETR/STOR payloads.
pub const TRANSFER_BUFFER_SIZE: usize = 64 * 1024;
