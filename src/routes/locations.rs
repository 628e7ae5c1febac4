//! Location routes. Public listing here; admin CRUD lives in `admin`.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::locations::Location;
use crate::error::ApiError;
use crate::services::cache::{get_or_load, keys};

/// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = get_or_load(state.cache(), keys::ACTIVE_LOCATIONS, || async {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, city, state, pincode, is_active
            FROM locations
            WHERE is_active
            ORDER BY state, city, name
            "#,
        )
        .fetch_all(&state.db)
        .await?;
        Ok::<_, ApiError>(locations)
    })
    .await?;

    Ok(Json(DataResponse::new(locations)))
}
