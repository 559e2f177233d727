//! # fleetsync Client
//!
//! HTTP adapter for the AMP control plane, implementing
//! `fleetsync_core::ControlPlane`.
//!
//! Every call is `POST {base}/API/{Module}/{Method}` with a JSON body that
//! carries `SESSIONID`. Instance calls are routed through the controller at
//! `{base}/API/ADSModule/Servers/{InstanceId}/API/...` with their own session,
//! obtained on first use and cached.
//!
//! ```no_run
//! use fleetsync_client::{AmpClient, ClientConfig};
//! use fleetsync_core::ControlPlane;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AmpClient::new(ClientConfig {
//!     base_url: "https://amp.example.net".to_string(),
//!     username: "admin".to_string(),
//!     password: "secret".to_string(),
//!     timeout_secs: 30,
//! })?;
//! client.login().await?;
//! for instance in client.list_instances().await? {
//!     println!("{}", instance.label());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::AmpClient;
pub use error::ClientError;
pub use types::ClientConfig;
