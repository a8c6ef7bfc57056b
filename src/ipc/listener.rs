//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! "Refresh"
//! {"SwitchToIndex":2}
//! {"SwitchTo":"42"}
//! {"Rename":{"id":"42","name":"Work"}}
//! {"RenameCurrent":"Mail"}
//! {"SetMode":"native"}
//! "ToggleVisibility"
//! "EnsurePermissions"
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited JSON
/// commands.  When the connection closes, the listener waits for the
/// next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called
    /// and removed when the command sink closes.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> UnixSocketError {
        UnixSocketError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Forward every command on one connection.  Returns `false` once the
    /// sink is gone.
    fn serve(&self, reader: impl BufRead, sink: &mpsc::Sender<Command>) -> bool {
        for line in reader.lines() {
            match line {
                Ok(ref text) if text.trim().is_empty() => continue,
                Ok(text) => match serde_json::from_str::<Command>(&text) {
                    Ok(cmd) => {
                        debug!("received {:?}", cmd);
                        if sink.send(cmd).is_err() {
                            return false;
                        }
                    }
                    Err(e) => warn!("bad command {:?}: {}", text, e),
                },
                Err(e) => {
                    error!("read error: {}", e);
                    break;
                }
            }
        }
        true
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** indefinitely.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path).map_err(|e| self.io_error(e))?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    if !self.serve(BufReader::new(stream), &sink) {
                        info!("sink closed, shutting down");
                        let _ = std::fs::remove_file(&self.path);
                        return Ok(());
                    }
                    debug!("client disconnected");
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        Ok(())
    }
}

//  Tests
