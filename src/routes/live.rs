use std::{convert::Infallible, time::Duration};

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures_util::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    events::{LiveEvent, Resource},
    middleware::auth::AuthUser,
    routes::params::LiveQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(live_events))
}

#[utoipa::path(
    get,
    path = "/api/live",
    params(
        ("resource" = Option<String>, Query, description = "Only one resource: orders, tables, invoices")
    ),
    responses(
        (status = 200, description = "text/event-stream of LiveEvent payloads", body = LiveEvent),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Live"
)]
pub async fn live_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LiveQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user_id = %user.user_id, resource = ?query.resource, "live subscriber connected");
    let receiver = state.events.subscribe();
    let stream = event_stream(receiver, user, query.resource);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .text("keep-alive")
            .interval(Duration::from_secs(15)),
    )
}

fn event_stream(
    mut receiver: broadcast::Receiver<LiveEvent>,
    user: AuthUser,
    resource: Option<Resource>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user.user_id, skipped, "live subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if resource.is_some_and(|r| r != event.resource) {
                continue;
            }
            if !event.visible_to(user.user_id, user.is_staff()) {
                continue;
            }

            let name = format!("{}.{}", event.resource.as_str(), event.action);
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok(Event::default().event(name).data(json)),
                Err(err) => tracing::warn!(error = %err, "live event encoding failed"),
            }
        }
    }
}
