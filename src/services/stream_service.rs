use std::{convert::Infallible, time::Duration};

use axum::response::{
    IntoResponse, Response,
    sse::{Event, KeepAlive, Sse},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::StreamHandshake,
    state::{SharedState, SubscriberId, broadcast::SnapshotPayload},
};

/// Name of the viewer stream announced in the handshake.
pub const STREAM_NAME: &str = "updates";
/// Pull endpoint a new subscriber loads its first snapshot from.
pub const SNAPSHOT_URL: &str = "/api/match-data";

const EVENT_CONNECTED: &str = "connected";
const EVENT_MATCH_UPDATE: &str = "match_update";

/// A registered viewer channel. Dropping it deregisters the subscriber.
pub struct Subscription {
    id: SubscriberId,
    state: SharedState,
    receiver: mpsc::Receiver<SnapshotPayload>,
}

impl Subscription {
    /// Create the per-connection queue and register it with the broadcaster.
    pub fn open(state: &SharedState) -> Self {
        let (sender, receiver) = mpsc::channel(state.subscriber_buffer());
        let id = state.broadcaster().subscribe(sender);
        info!(
            subscriber = %id,
            subscribers = state.broadcaster().subscriber_count(),
            "subscriber connected"
        );
        Self {
            id,
            state: state.clone(),
            receiver,
        }
    }

    /// Identifier issued by the broadcaster.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next snapshot, or `None` once the broadcaster dropped this subscriber.
    pub async fn next(&mut self) -> Option<SnapshotPayload> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.state.broadcaster().unsubscribe(self.id) {
            info!(subscriber = %self.id, "subscriber closed");
        } else {
            debug!(subscriber = %self.id, "stream ended for dropped subscriber");
        }
    }
}

/// Turn a subscription into an SSE response: a `connected` handshake followed
/// by one `match_update` event per published snapshot. Keep-alive comments are
/// only sent when `keep_alive` is set.
pub fn to_sse_stream(mut subscription: Subscription, keep_alive: Option<Duration>) -> Response {
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(handshake_event());
        while let Some(payload) = subscription.next().await {
            yield Ok(Event::default().event(EVENT_MATCH_UPDATE).data(&*payload));
        }
    };

    let sse = Sse::new(stream);
    match keep_alive {
        Some(interval) => sse
            .keep_alive(KeepAlive::new().interval(interval).text("keep-alive"))
            .into_response(),
        None => sse.into_response(),
    }
}

fn handshake_event() -> Event {
    let handshake = StreamHandshake {
        stream: STREAM_NAME,
        snapshot_url: SNAPSHOT_URL,
    };
    match Event::default().event(EVENT_CONNECTED).json_data(&handshake) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "failed to serialize stream handshake");
            Event::default().event(EVENT_CONNECTED).data(STREAM_NAME)
        }
    }
}
