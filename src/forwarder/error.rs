use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("could not find {role} executable: {path}")]
    MissingExecutable { role: &'static str, path: PathBuf },
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("datagram from unknown source {0}")]
    UnknownSource(SocketAddr),
    #[error("datagram from receiver {0} before the sender was learned")]
    SenderUnknown(SocketAddr),
    #[error("test {name} timed out after {elapsed:?}")]
    TimedOut { name: String, elapsed: Duration },
    #[error("interrupted")]
    Interrupted,
    #[error("spawn peers: {0}")]
    Spawn(#[source] io::Error),
    #[error("socket: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
