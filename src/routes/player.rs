use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::player::{
        AddPlayerRequest, GetPlayerRequest, ListPlayersQuery, PlayerAddedResponse,
        PlayerDetailResponse, PlayerListResponse, PlayerScoreResponse,
    },
    error::AppError,
    routes::extract::{ApiJson, ApiPath, ApiQuery},
    services::player_service,
    state::SharedState,
};

const PLAYER_NOT_FOUND: &str = "Player not found";

/// Player score endpoints, mounted under `/api/player` and the legacy `/player` prefix.
///
/// The static `add` and `get` segments take precedence over `/{username}`.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_players))
        .route("/add", post(add_player))
        .route("/get", post(get_player_score))
        .route("/{username}", get(get_player))
}

#[utoipa::path(
    post,
    path = "/api/player/add",
    tag = "players",
    request_body = AddPlayerRequest,
    responses(
        (status = 201, description = "Player created or score replaced", body = PlayerAddedResponse),
        (status = 400, description = "Invalid username or score"),
        (status = 500, description = "Storage failure")
    )
)]
/// Create the player, or replace the score of an existing one.
pub async fn add_player(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<AddPlayerRequest>,
) -> Result<(StatusCode, Json<PlayerAddedResponse>), AppError> {
    let (username, score) = payload.validated()?;
    let player = player_service::upsert_player(&state, username, score).await?;
    Ok((StatusCode::CREATED, Json(player.into())))
}

#[utoipa::path(
    post,
    path = "/api/player/get",
    tag = "players",
    request_body = GetPlayerRequest,
    responses(
        (status = 200, description = "Player score", body = PlayerScoreResponse),
        (status = 400, description = "Missing username"),
        (status = 404, description = "Unknown player"),
        (status = 500, description = "Storage failure")
    )
)]
/// Return the score of the player named in the body.
pub async fn get_player_score(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<GetPlayerRequest>,
) -> Result<Json<PlayerScoreResponse>, AppError> {
    payload.validate()?;
    let player = player_service::get_player(&state, payload.username())
        .await?
        .ok_or_else(|| AppError::NotFound(PLAYER_NOT_FOUND.into()))?;
    Ok(Json(player.into()))
}

#[utoipa::path(
    get,
    path = "/api/player/{username}",
    tag = "players",
    params(("username" = String, Path, description = "Player name, case-insensitive")),
    responses(
        (status = 200, description = "Full player record", body = PlayerDetailResponse),
        (status = 400, description = "Blank username"),
        (status = 404, description = "Unknown player"),
        (status = 500, description = "Storage failure")
    )
)]
/// Return the full record of one player.
pub async fn get_player(
    State(state): State<SharedState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<PlayerDetailResponse>, AppError> {
    let player = player_service::get_player(&state, &username)
        .await?
        .ok_or_else(|| AppError::NotFound(PLAYER_NOT_FOUND.into()))?;
    Ok(Json(player.into()))
}

#[utoipa::path(
    get,
    path = "/api/player",
    tag = "players",
    params(ListPlayersQuery),
    responses(
        (status = 200, description = "Players ordered by score, highest first", body = PlayerListResponse),
        (status = 400, description = "Limit out of range"),
        (status = 500, description = "Storage failure")
    )
)]
/// List the top players.
pub async fn list_players(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<ListPlayersQuery>,
) -> Result<Json<PlayerListResponse>, AppError> {
    query.validate()?;
    let players = player_service::list_players(&state, query.limit).await?;
    Ok(Json(players.into()))
}
