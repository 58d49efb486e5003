use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the player score service.
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::player::add_player,
        crate::routes::player::get_player_score,
        crate::routes::player::get_player,
        crate::routes::player::list_players,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::StorageStatus,
            crate::dto::player::AddPlayerRequest,
            crate::dto::player::GetPlayerRequest,
            crate::dto::player::AddedPlayer,
            crate::dto::player::PlayerAddedResponse,
            crate::dto::player::PlayerScore,
            crate::dto::player::PlayerScoreResponse,
            crate::dto::player::PlayerDetail,
            crate::dto::player::PlayerDetailResponse,
            crate::dto::player::PlayerListResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "Player score registration and lookup"),
    )
)]
pub struct ApiDoc;
