//! AIS sentence feed client
//!
//! Maintains a long-lived TCP session with an AIS relay, logs in with the
//! relay's NUL-delimited handshake, reassembles two-part sentences, keeps
//! only message types 0, 1, 2 and 18 (leading `0`, `1`, `2`, `B`) and
//! buffers them for consumers that drain on their own schedule. Lost
//! connections are redialed after a fixed delay until the feed is closed.
//!
//! ```no_run
//! use ais_feed::{AisConnection, Endpoint, ManagedConnection};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let managed = ManagedConnection::new();
//! let feed = managed.get_connection();
//! feed.open(Endpoint::parse("ais.example.com", 4712, "user", "secret")?).await?;
//!
//! for sentence in feed.sentences() {
//!     println!("{sentence}");
//! }
//! feed.close().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod args;
pub mod buffer;
pub mod config;
pub mod connection_error;
pub mod connector;
pub mod constants;
pub mod frame;
pub mod handle;
pub mod line;
pub mod logging;
pub mod network;
pub mod sentence;
pub mod session;
pub mod status;
pub mod types;

pub use adapter::{
    AdapterError, ConnectionEvent, ConnectionEventListener, ConnectionMetadata, ManagedConnection,
};
pub use args::FeedArgs;
pub use buffer::SentenceBuffer;
pub use config::{Config, create_default_config, load_config};
pub use connection_error::ConnectionError;
pub use connector::{ConnectorError, RetryingConnector};
pub use frame::{Frame, FrameAssembler, SkipReason};
pub use handle::{AisConnection, ConnectionHandle, HandleError};
pub use line::{LineReader, RawLine};
pub use logging::init_logging;
pub use sentence::{AcceptedType, accepts};
pub use status::{FeedStats, FeedStatus};
pub use types::{Endpoint, HandleId, SessionState};
