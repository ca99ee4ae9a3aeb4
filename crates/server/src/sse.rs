use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AppState;

/// Where SSE clients post their JSON-RPC requests.
pub const MESSAGE_PATH: &str = "/message";

/// Frames an SSE session emits. Responses never travel on the stream; it
/// only announces the message endpoint and then signals liveness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `event: endpoint` naming the message path, sent once on connect.
    Endpoint,
    /// `: keep-alive` comment.
    KeepAlive,
}

impl SseFrame {
    pub fn into_event(self) -> Event {
        match self {
            Self::Endpoint => Event::default().event("endpoint").data(MESSAGE_PATH),
            Self::KeepAlive => Event::default().comment("keep-alive"),
        }
    }
}

/// Logs the end of a session however the stream stops: peer gone,
/// shutdown, or body dropped.
struct SessionGuard {
    id: Uuid,
    opened: Instant,
}

impl SessionGuard {
    fn open() -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "SSE client connected");
        Self {
            id,
            opened: Instant::now(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::info!(
            session = %self.id,
            duration_ms = self.opened.elapsed().as_millis() as u64,
            "SSE client disconnected"
        );
    }
}

/// Frame sequence for one session: the endpoint announcement, then a
/// keep-alive every `interval` until `shutdown` fires. A dropped peer ends
/// the session at the next failed write.
pub fn session_frames(
    interval: Duration,
    shutdown: CancellationToken,
) -> impl Stream<Item = SseFrame> {
    async_stream::stream! {
        let session = SessionGuard::open();
        yield SseFrame::Endpoint;

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let cancelled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => true,
                _ = ticker.tick() => false,
            };
            if cancelled {
                tracing::info!(session = %session.id, "SSE stream cancelled by shutdown");
                break;
            }
            yield SseFrame::KeepAlive;
        }
    }
}

/// `GET /sse`
pub async fn sse_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let frames = session_frames(state.config.keep_alive(), state.shutdown.child_token());
    let events = frames.map(|frame| Ok::<_, Infallible>(frame.into_event()));

    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(events),
    )
}
