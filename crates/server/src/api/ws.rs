//! WebSocket support for live job updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tunegrab_core::{JobOutcome, PipelineError, ProgressEvent, ProgressStage};

use crate::metrics::{WS_CLIENTS, WS_EVENTS_DROPPED, WS_EVENTS_SENT};
use crate::state::AppState;

/// How a job ended, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    Success,
    Cancelled,
    Failed,
}

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A job reported progress.
    Progress {
        job_id: String,
        stage: ProgressStage,
        /// 0.0 - 100.0
        percent: f32,
    },
    /// A job reached a terminal state.
    JobFinished {
        job_id: String,
        result: JobResult,
        #[serde(skip_serializing_if = "Option::is_none")]
        output_path: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        has_artwork: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn type_label(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::JobFinished { .. } => "job_finished",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means nobody is connected
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Forward a pipeline progress event.
    pub fn progress(&self, event: ProgressEvent) {
        self.broadcast(WsMessage::Progress {
            job_id: event.job_id,
            stage: event.stage,
            percent: event.percent,
        });
    }

    /// Report the terminal state of a job.
    pub fn job_finished(&self, job_id: &str, result: &Result<JobOutcome, PipelineError>) {
        let msg = match result {
            Ok(outcome) => WsMessage::JobFinished {
                job_id: job_id.to_string(),
                result: JobResult::Success,
                output_path: Some(outcome.output_path.clone()),
                has_artwork: Some(outcome.has_artwork),
                error: None,
                error_kind: None,
            },
            Err(e) => WsMessage::JobFinished {
                job_id: job_id.to_string(),
                result: if e.is_cancelled() {
                    JobResult::Cancelled
                } else {
                    JobResult::Failed
                },
                output_path: None,
                has_artwork: None,
                error: (!e.is_cancelled()).then(|| e.user_message()),
                error_kind: Some(e.kind().to_string()),
            },
        };
        self.broadcast(msg);
    }

    /// Broadcast a heartbeat stamped with the current time.
    pub fn heartbeat(&self) {
        self.broadcast(WsMessage::Heartbeat {
            timestamp: Utc::now().timestamp(),
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Sends a heartbeat every `interval` until the task is aborted.
pub fn spawn_heartbeat(broadcaster: WsBroadcaster, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            broadcaster.heartbeat();
        }
    })
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.ws_broadcaster().subscribe();

    WS_CLIENTS.inc();

    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_EVENTS_SENT.with_label_values(&[msg.type_label()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_EVENTS_DROPPED.inc_by(n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only ever close; anything else is logged and ignored
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CLIENTS.dec();
    info!("WebSocket client disconnected");
}
