use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http::AppState;
use crate::supervisor::RecordingState;

/// Requests accepted from a monitoring observer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum MonitorRequest {
    #[serde(rename = "subscribe_participant")]
    SubscribeParticipant { participant_identity: String },
    #[serde(rename = "get_all_recordings")]
    GetAllRecordings,
}

/// Events sent to a monitoring observer (audio chunk events are produced by
/// the broadcast hub and forwarded verbatim).
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum MonitorEvent {
    #[serde(rename = "connected")]
    Connected { room_name: String, timestamp: String },
    #[serde(rename = "recording_status")]
    RecordingStatus {
        participant_identity: String,
        status: Option<RecordingState>,
        timestamp: String,
    },
    #[serde(rename = "all_recordings_status")]
    AllRecordingsStatus {
        recordings: HashMap<String, RecordingState>,
        timestamp: String,
    },
}

/// GET /monitor — passive observer connection.
pub async fn monitor_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_monitor(socket, state))
}

async fn handle_monitor(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let hub = state.supervisor.hub();
    let (observer_id, mut events) = hub.subscribe(None).await;

    info!(observer = %observer_id, "monitor client connected");

    let welcome = MonitorEvent::Connected {
        room_name: state.settings.room.clone(),
        timestamp: Utc::now().to_rfc3339(),
    };
    if send_event(&mut sender, &welcome).await.is_err() {
        hub.unsubscribe(observer_id).await;
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<MonitorRequest>(&text) {
                        Ok(request) => {
                            let reply = handle_request(&state, observer_id, request).await;
                            if send_event(&mut sender, &reply).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(observer = %observer_id, "ignoring invalid monitor request: {}", e);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(observer = %observer_id, "monitor transport error: {}", e);
                    break;
                }
            },
        }
    }

    hub.unsubscribe(observer_id).await;
    info!(observer = %observer_id, "monitor client disconnected");
}

async fn handle_request(
    state: &AppState,
    observer_id: crate::broadcast::ObserverId,
    request: MonitorRequest,
) -> MonitorEvent {
    match request {
        MonitorRequest::SubscribeParticipant {
            participant_identity,
        } => {
            info!(
                observer = %observer_id,
                participant = %participant_identity,
                "monitor subscribed to participant"
            );
            state
                .supervisor
                .hub()
                .set_filter(observer_id, Some(participant_identity.clone()))
                .await;
            let status = state.supervisor.status(&participant_identity).await;
            MonitorEvent::RecordingStatus {
                participant_identity,
                status,
                timestamp: Utc::now().to_rfc3339(),
            }
        }
        MonitorRequest::GetAllRecordings => MonitorEvent::AllRecordingsStatus {
            recordings: state.supervisor.status_all().await,
            timestamp: Utc::now().to_rfc3339(),
        },
    }
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &MonitorEvent,
) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize monitor event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await.map_err(|_| ())
}
