use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::audio::AudioChunk;
use crate::error::RecordingError;
use crate::http::AppState;

/// Identifying parameters carried in the connection's handshake query.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub track_id: Option<String>,
    pub room: Option<String>,
    pub participant: Option<String>,
}

/// Control message sent by the egress service as a text frame.
///
/// The type is kept as a plain string so unrecognized control types parse
/// fine and can be logged and ignored.
#[derive(Debug, Deserialize)]
struct ControlMessage {
    #[serde(rename = "type")]
    message_type: String,
}

/// GET /audio-stream — one inbound duplex stream per (track, participant).
///
/// Missing any identifying parameter is fatal for the connection: it is
/// rejected before any frame is processed.
pub async fn audio_stream_handler(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let (room, track_id, participant) = match require_params(params) {
        Ok(parts) => parts,
        Err(e) => {
            error!("rejecting audio stream connection: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    if room != state.settings.room {
        warn!(
            room = %room,
            expected = %state.settings.room,
            "audio stream connected for a different room"
        );
    }

    ws.on_upgrade(move |socket| handle_egress_stream(socket, state, track_id, participant))
}

fn require_params(params: StreamParams) -> Result<(String, String, String), RecordingError> {
    match (params.room, params.track_id, params.participant) {
        (Some(room), Some(track_id), Some(participant)) => Ok((room, track_id, participant)),
        (room, track_id, participant) => {
            let mut missing = Vec::new();
            if room.is_none() {
                missing.push("room");
            }
            if track_id.is_none() {
                missing.push("track_id");
            }
            if participant.is_none() {
                missing.push("participant");
            }
            Err(RecordingError::MissingStreamParameters(missing.join(", ")))
        }
    }
}

async fn handle_egress_stream(
    mut socket: WebSocket,
    state: AppState,
    track_id: String,
    participant: String,
) {
    info!(participant = %participant, track = %track_id, "egress audio stream connected");

    let sample_rate = state.settings.sample_rate;
    let channels = state.settings.channel_count;
    let mut sequence: u64 = 0;
    let mut messages_received: u64 = 0;

    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(participant = %participant, "audio stream transport error: {}", e);
                break;
            }
        };
        messages_received += 1;

        match message {
            Message::Binary(data) => {
                match AudioChunk::new(&participant, sequence, data, sample_rate, channels) {
                    Ok(chunk) => {
                        sequence += 1;
                        state.supervisor.ingest_chunk(chunk).await;
                    }
                    Err(e) => {
                        // Drop the chunk, keep the stream alive.
                        warn!(participant = %participant, "dropping invalid audio chunk: {}", e);
                    }
                }
            }
            Message::Text(text) => match serde_json::from_str::<ControlMessage>(&text) {
                Ok(control) => match control.message_type.as_str() {
                    "track_muted" => {
                        info!(participant = %participant, "track muted");
                    }
                    "track_unmuted" => {
                        info!(participant = %participant, "track unmuted");
                    }
                    "track_ended" => {
                        info!(participant = %participant, "track ended");
                        break;
                    }
                    other => {
                        info!(
                            participant = %participant,
                            control_type = %other,
                            "ignoring unrecognized control message"
                        );
                    }
                },
                Err(e) => {
                    warn!(participant = %participant, "dropping malformed control message: {}", e);
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    info!(
        participant = %participant,
        messages = messages_received,
        "egress audio stream ended, finalizing"
    );

    // Track end and abrupt disconnect both land here: flush whatever is
    // buffered now instead of waiting for the next threshold crossing.
    state.supervisor.finalize(&participant).await;
}
