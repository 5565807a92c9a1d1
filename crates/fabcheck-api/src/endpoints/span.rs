// SPAN (port mirroring) session endpoints

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{SpanList, SpanSession};

impl FabricClient {
    /// `GET span/v1/sessions`
    pub async fn list_span_sessions(&self) -> Result<SpanList, Error> {
        self.get("span/v1/sessions").await
    }

    /// `GET span/v1/sessions/{id}`
    pub async fn span_session(&self, session: u32) -> Result<SpanSession, Error> {
        self.get(&format!("span/v1/sessions/{session}")).await
    }

    /// `POST span/v1/sessions`
    pub async fn create_span_session(&self, req: &SpanSession) -> Result<(), Error> {
        debug!(
            session = req.session,
            src = %req.src.device_id,
            src_port = req.src.port,
            direction = %req.src.direction,
            target = %req.target.device_id,
            target_port = req.target.port,
            "creating span session"
        );
        self.post("span/v1/sessions", req).await
    }

    /// `DELETE span/v1/sessions/{id}`
    pub async fn delete_span_session(&self, session: u32) -> Result<(), Error> {
        debug!(session, "deleting span session");
        self.delete(&format!("span/v1/sessions/{session}")).await
    }
}
