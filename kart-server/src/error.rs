use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Failures at the edges of the server. The race simulation itself never fails.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read course file {path}: {source}")]
    CourseRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse course file {path}: {source}")]
    CourseParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to bind websocket listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}
