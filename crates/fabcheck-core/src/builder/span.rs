use async_trait::async_trait;
use fabcheck_api::models::{SpanDirection, SpanSession, SpanSource, SpanTarget};
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;

const KIND: &str = "span session";

/// Port mirroring session: copies of traffic on `source` go out `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    session: u32,
    source: Option<SpanSource>,
    target: Option<SpanTarget>,
}

impl Span {
    pub fn new(session: u32) -> Self {
        Self {
            session,
            source: None,
            target: None,
        }
    }

    pub fn source(
        mut self,
        device_id: impl Into<String>,
        port: u32,
        direction: SpanDirection,
    ) -> Self {
        self.source = Some(SpanSource {
            device_id: device_id.into(),
            port,
            direction,
        });
        self
    }

    pub fn target(mut self, device_id: impl Into<String>, port: u32) -> Self {
        self.target = Some(SpanTarget {
            device_id: device_id.into(),
            port,
        });
        self
    }

    pub fn request(&self) -> Result<SpanSession, CoreError> {
        let src = self
            .source
            .clone()
            .ok_or_else(|| CoreError::validation("span.source", "required"))?;
        let target = self
            .target
            .clone()
            .ok_or_else(|| CoreError::validation("span.target", "required"))?;
        if src.device_id == target.device_id && src.port == target.port {
            return Err(CoreError::validation(
                "span.target",
                "target port must differ from the source port",
            ));
        }
        Ok(SpanSession {
            session: self.session,
            src,
            target,
        })
    }

    pub async fn build(self, fabric: &Fabric) -> Result<SpanHandle, CoreError> {
        let request = self.request()?;
        fabric.client().create_span_session(&request).await?;
        info!(
            session = self.session,
            src = %format!("{}/{}", request.src.device_id, request.src.port),
            target = %format!("{}/{}", request.target.device_id, request.target.port),
            "span session built"
        );
        Ok(SpanHandle {
            request,
            live: Liveness::default(),
        })
    }

    /// Read a stored session by id.
    pub async fn session(fabric: &Fabric, id: u32) -> Result<SpanSession, CoreError> {
        fabric.span_session(id).await
    }
}

#[derive(Debug, Clone)]
pub struct SpanHandle {
    request: SpanSession,
    live: Liveness,
}

impl SpanHandle {
    pub fn session_id(&self) -> u32 {
        self.request.session
    }

    pub fn request(&self) -> &SpanSession {
        &self.request
    }

    /// True if the stored session has the source and target pushed here.
    pub async fn matches_stored(&self, fabric: &Fabric) -> Result<bool, CoreError> {
        let stored = fabric.span_session(self.request.session).await?;
        Ok(stored.src == self.request.src && stored.target == self.request.target)
    }
}

#[async_trait]
impl Destroy for SpanHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        let session = self.request.session;
        self.live
            .destroy_with(KIND, &session.to_string(), || async {
                Ok(fabric.client().delete_span_session(session).await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("span session {}", self.request.session)
    }
}
