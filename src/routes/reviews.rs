//! Product review routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireActive;
use crate::domain::reviews::{CreateReviewRequest, ProductReviews, Review, ReviewSummary};
use crate::error::ApiError;
use crate::validation::ValidationErrors;

const MAX_COMMENT_CHARS: usize = 2000;

fn validate_review(req: &CreateReviewRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !(1..=5).contains(&req.rating) {
        errors.add("rating", "Rating must be between 1 and 5");
    }
    if let Some(comment) = &req.comment {
        if comment.chars().count() > MAX_COMMENT_CHARS {
            errors.add(
                "comment",
                format!("Comment must be at most {} characters", MAX_COMMENT_CHARS),
            );
        }
    }
    errors.into_result()
}

/// GET /api/products/:id/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT r.id, r.product_id, r.user_id, u.name AS user_name, r.rating, r.comment, r.created_at
        FROM reviews r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.product_id = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&state.db)
    .await?;

    let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();
    Ok(Json(DataResponse::new(ProductReviews {
        summary: ReviewSummary::from_ratings(&ratings),
        reviews,
    })))
}

/// POST /api/products/:id/reviews
///
/// One review per customer and product.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_review(&req)?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1 AND status = 'active')",
    )
    .bind(product_id)
    .fetch_one(&state.db)
    .await?;
    if !exists {
        return Err(ApiError::not_found("Product not found"));
    }

    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let review = sqlx::query_as::<_, Review>(
        r#"
        WITH inserted AS (
            INSERT INTO reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, rating, comment, created_at
        )
        SELECT i.id, i.product_id, i.user_id, u.name AS user_name, i.rating, i.comment, i.created_at
        FROM inserted i
        LEFT JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(product_id)
    .bind(auth.user_id)
    .bind(req.rating)
    .bind(comment)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => {
            ApiError::Conflict("You have already reviewed this product".to_string())
        }
        other => other,
    })?;

    tracing::info!(user_id = %auth.user_id, product_id = %product_id, rating = req.rating, "Review created");

    Ok(Created(review))
}

/// DELETE /api/reviews/:id
///
/// Authors may delete their own reviews; admins may delete any.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let author: Uuid = sqlx::query_scalar("SELECT user_id FROM reviews WHERE id = $1")
        .bind(review_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    if author != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("You can only delete your own reviews"));
    }

    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = %auth.user_id, review_id = %review_id, "Review deleted");

    Ok(NoContent)
}
