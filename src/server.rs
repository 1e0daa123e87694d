//! HTTP and WebSocket surface.
//!
//! REST endpoints under `/api/rooms` read and mutate matches through the
//! [`MatchCoordinator`]; `/ws/game/{id}` upgrades to the real-time channel.

use crate::coordinator::{Connection, CoordinatorError, MatchCoordinator};
use crate::protocol::ClientMessage;
use crate::registry::{SessionRegistry, SocketHandle};
use crate::snapshot::{MatchDetail, MatchSnapshot};
use crate::store::{MatchStore, MemoryStore};
use crate::{
    AuthError, DbError, Identity, MatchId, MatchRepository, PlayerDirectory, ServerConfig,
};
use axum::body::Body;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, instrument, warn};

/// Close code for a connection whose token did not resolve.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
/// Close code for a connection to an unknown match.
pub const CLOSE_MATCH_NOT_FOUND: u16 = 4002;
/// Close code when the match could not be loaded.
const CLOSE_INTERNAL: u16 = 1011;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    coordinator: Arc<MatchCoordinator>,
}

impl AppState {
    /// Wraps a coordinator.
    pub fn new(coordinator: Arc<MatchCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Builds the store, directory and coordinator described by `config`.
    ///
    /// With a `db_path` the SQLite store is migrated before use.
    ///
    /// # Errors
    ///
    /// [`DbError`] if the database cannot be prepared.
    #[instrument(skip(config), fields(db_path = ?config.db_path()))]
    pub fn from_config(config: &ServerConfig) -> Result<Self, DbError> {
        let store: Arc<dyn MatchStore> = match config.db_path() {
            Some(path) => {
                let repository = MatchRepository::new(path.clone())?;
                repository.run_migrations()?;
                Arc::new(repository)
            }
            None => {
                warn!("No database configured; matches are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };
        let directory: Arc<dyn PlayerDirectory> = Arc::new(config.directory());
        let coordinator = MatchCoordinator::new(store, directory, SessionRegistry::new());
        Ok(Self::new(Arc::new(coordinator)))
    }

    /// The coordinator behind the handlers.
    pub fn coordinator(&self) -> &Arc<MatchCoordinator> {
        &self.coordinator
    }
}

/// Error response with a `{"detail": ...}` body.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match &err {
            CoordinatorError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Game not found"),
            CoordinatorError::Rejected(rejection) => {
                Self::new(StatusCode::BAD_REQUEST, rejection.to_string())
            }
            CoordinatorError::Store(store) => {
                warn!(error = %store, "Request failed in store");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Builds the application router.
///
/// Cross-origin requests are allowed from any origin so a browser client
/// served elsewhere can call the API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/{id}", get(get_room))
        .route("/api/rooms/{id}/join", post(join_room))
        .route("/api/rooms/{id}/move", post(make_move))
        .route("/ws/game/{id}", get(game_socket))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `config`'s address and serves until the process exits.
///
/// # Errors
///
/// Fails if the store cannot be prepared or the address cannot be bound.
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Match server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn bearer(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthenticated)?;
    Ok(state.coordinator.directory().resolve(token.trim())?)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to Strictly Gomoku" }))
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

#[instrument(skip(state))]
async fn list_rooms(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<MatchSnapshot>>, ApiError> {
    let matches = state.coordinator.list_matches(page.skip, page.limit).await?;
    Ok(Json(matches.iter().map(MatchSnapshot::from).collect()))
}

#[instrument(skip(state, headers))]
async fn create_room(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<MatchSnapshot>), ApiError> {
    let identity = bearer(&state, &headers)?;
    let game = state.coordinator.create_match(*identity.id()).await?;
    Ok((StatusCode::CREATED, Json(MatchSnapshot::from(&game))))
}

#[instrument(skip(state))]
async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchDetail>, ApiError> {
    let game = state.coordinator.snapshot(id).await?;
    Ok(Json(MatchDetail::from(&game)))
}

#[instrument(skip(state, headers))]
async fn join_room(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
    headers: HeaderMap,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let identity = bearer(&state, &headers)?;
    let game = state.coordinator.join_match(id, *identity.id()).await?;
    Ok(Json(MatchSnapshot::from(&game)))
}

#[derive(Debug, Deserialize)]
struct MoveBody {
    x: i64,
    y: i64,
}

#[instrument(skip(state, headers))]
async fn make_move(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
    headers: HeaderMap,
    Json(body): Json<MoveBody>,
) -> Result<Json<MatchSnapshot>, ApiError> {
    let identity = bearer(&state, &headers)?;
    let committed = state
        .coordinator
        .submit_move(id, *identity.id(), body.x, body.y)
        .await?;
    Ok(Json(MatchSnapshot::from(committed.game())))
}

#[derive(Debug, Deserialize)]
struct SocketParams {
    token: Option<String>,
}

async fn game_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
    Query(params): Query<SocketParams>,
) -> Response {
    ws.on_upgrade(move |socket| run_socket(state, socket, id, params.token))
}

async fn close(mut socket: WebSocket, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    };
    if let Err(err) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %err, "Close frame not delivered");
    }
}

/// Drives one socket: authenticate, register, then pump both directions
/// until either side goes away.
#[instrument(skip(state, socket, token))]
async fn run_socket(state: AppState, mut socket: WebSocket, match_id: MatchId, token: Option<String>) {
    let coordinator = state.coordinator.clone();

    let resolved = token
        .as_deref()
        .ok_or(AuthError::Unauthenticated)
        .and_then(|token| coordinator.directory().resolve(token));
    let identity = match resolved {
        Ok(identity) => identity,
        Err(err) => {
            info!(error = %err, "Socket rejected");
            close(socket, CLOSE_UNAUTHENTICATED, "Could not validate credentials").await;
            return;
        }
    };

    let (handle, mut outbound) = SocketHandle::channel(coordinator.next_connection_id());
    let connection: Connection = match coordinator.connect(match_id, identity, handle).await {
        Ok(connection) => connection,
        Err(CoordinatorError::NotFound { .. }) => {
            info!("Socket rejected: match not found");
            close(socket, CLOSE_MATCH_NOT_FOUND, "Game not found").await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "Socket rejected: match unavailable");
            close(socket, CLOSE_INTERNAL, "Game unavailable").await;
            return;
        }
    };

    loop {
        tokio::select! {
            event = outbound.recv() => match event {
                Some(event) => match event.to_json() {
                    Ok(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "Event not serializable"),
                },
                None => {
                    debug!("Socket superseded by a newer connection");
                    if let Err(err) = socket.send(Message::Close(None)).await {
                        debug!(error = %err, "Close frame not delivered");
                    }
                    break;
                }
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                    Ok(message) => {
                        if let Err(err) = coordinator.handle_message(&connection, message).await {
                            debug!(error = %err, "Action dropped");
                        }
                    }
                    Err(err) => debug!(error = %err, "Malformed message dropped"),
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    coordinator.disconnect(&connection).await;
}
