pub mod downloads;
pub mod error;
pub mod handlers;
pub mod media;
pub mod routes;
pub mod ws;

pub use error::ApiError;
pub use routes::create_router;
pub use ws::{spawn_heartbeat, WsBroadcaster, WsMessage};
