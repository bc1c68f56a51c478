//! HTTP front end: shared state, routes, and server startup.
//!
//! The messaging platform POSTs every chat message it sees to `/messages`
//! and relays the returned reply (if any) back to the chat.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use taskbot::TaskBot;
use taskbot::assistant::Assistant;
use taskbot::store::TaskStore;
use taskbot_proto::wire::{InboundMessage, ReplyBody};

/// Shared gateway state.
pub struct GatewayState<S, A> {
    bot: Arc<TaskBot<S, A>>,
}

impl<S, A> GatewayState<S, A> {
    /// Wraps a bot shared with the reminder loop.
    #[must_use]
    pub const fn new(bot: Arc<TaskBot<S, A>>) -> Self {
        Self { bot }
    }

    /// The bot behind this gateway.
    #[must_use]
    pub const fn bot(&self) -> &Arc<TaskBot<S, A>> {
        &self.bot
    }
}

/// Reasons a request is refused before reaching the bot.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The `owner` field was blank.
    #[error("owner must not be empty")]
    EmptyOwner,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()).into_response()
    }
}

/// Builds the router for `state`.
pub fn router<S, A>(state: Arc<GatewayState<S, A>>) -> Router
where
    S: TaskStore + 'static,
    A: Assistant + 'static,
{
    Router::new()
        .route("/messages", post(post_message::<S, A>))
        .route("/health", get(health))
        .with_state(state)
}

/// Starts the gateway on `addr` and returns the bound address and a join
/// handle. The server stops accepting connections once `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state<S, A>(
    addr: &str,
    state: Arc<GatewayState<S, A>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
>
where
    S: TaskStore + 'static,
    A: Assistant + 'static,
{
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "gateway server error");
        }
    });

    Ok((bound_addr, handle))
}

/// `POST /messages`: run one chat message through the bot.
async fn post_message<S, A>(
    State(state): State<Arc<GatewayState<S, A>>>,
    Json(msg): Json<InboundMessage>,
) -> Result<Json<ReplyBody>, GatewayError>
where
    S: TaskStore,
    A: Assistant,
{
    if msg.owner.as_str().trim().is_empty() {
        return Err(GatewayError::EmptyOwner);
    }
    let reply = state.bot.handle(&msg.owner, msg.text.trim()).await;
    tracing::debug!(
        owner = %msg.owner,
        destination = %msg.destination,
        replied = reply.is_some(),
        "message handled"
    );
    Ok(Json(ReplyBody {
        destination: msg.destination,
        reply,
    }))
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
