//! Session connection resolution
//!
//! An explicit session object at any level switches the composer into strict
//! mode: `server` and `sessionId` must then be present together. With no
//! explicit object at all, a complete default is generated.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::compose::device::DeviceConfig;
use crate::document::RawConfigDocument;
use crate::errors::ConfigError;

/// Default port of the lane's control-channel server.
pub const DEFAULT_SERVER_PORT: u16 = 8099;

/// Resolved session connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub server: String,
    pub session_id: String,

    /// Only set for generated defaults; an explicit session object is carried
    /// through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

/// Resolve the session: selected configuration > global document > generated.
pub fn compose_session_config(
    device: &DeviceConfig,
    doc: &RawConfigDocument,
) -> Result<SessionConfig, ConfigError> {
    let explicit = device.session.as_ref().or(doc.session.as_ref());

    let Some(raw) = explicit else {
        return Ok(SessionConfig {
            server: format!("ws://localhost:{DEFAULT_SERVER_PORT}"),
            session_id: Uuid::new_v4().to_string(),
            auto_start: Some(true),
        });
    };

    let server = raw
        .server
        .clone()
        .ok_or(ConfigError::MissingSessionServer)?;
    let session_id = raw
        .session_id
        .clone()
        .ok_or(ConfigError::MissingSessionId)?;

    if !server.starts_with("ws://") && !server.starts_with("wss://") {
        warn!(server = %server, "session.server does not look like a ws:// URL");
    }

    Ok(SessionConfig {
        server,
        session_id,
        auto_start: raw.auto_start,
    })
}
