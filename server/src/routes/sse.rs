// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The SSE notification stream. A connecting client gets a CONNECTED
//! greeting, a replay of the subject's ring buffer, then live messages.
//! Idle streams carry a typed PING at the keepalive interval so proxies
//! and load balancers leave the connection alone. The subscription is
//! removed when the client goes away.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use futures::Stream;
use tracing::debug;
use vigil_engine::domain::Notification;
use vigil_engine::infrastructure::EventBus;

use crate::state::SharedState;

pub async fn stream(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.bus.subscribe(&session_id);
    let recent = state.bus.recent(&session_id);
    let keepalive = state.keepalive;
    let bus = state.bus.clone();

    let stream = async_stream::stream! {
        let _guard = UnsubscribeGuard {
            bus,
            subject_id: session_id.clone(),
            subscription_id: subscription.id(),
        };
        debug!(%session_id, "sse listener attached");

        yield Ok::<Event, Infallible>(frame(&Notification::Connected {
            session_id: session_id.clone(),
        }));

        for message in recent {
            yield Ok(frame(&message));
        }

        loop {
            match tokio::time::timeout(keepalive, subscription.recv()).await {
                Ok(Some(message)) => yield Ok(frame(&message)),
                Ok(None) => break,
                Err(_) => yield Ok(frame(&Notification::Ping)),
            }
        }
    };

    Sse::new(stream)
}

fn frame(message: &Notification) -> Event {
    Event::default().data(serde_json::to_string(message).unwrap_or_default())
}

/// Detaches the subscription when the client disconnects and the stream is
/// dropped mid-await.
struct UnsubscribeGuard {
    bus: Arc<EventBus>,
    subject_id: String,
    subscription_id: u64,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        debug!(subject_id = %self.subject_id, "sse listener detached");
        self.bus.unsubscribe(&self.subject_id, self.subscription_id);
    }
}
