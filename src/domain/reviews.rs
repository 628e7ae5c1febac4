use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product review with reviewer name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Rating histogram plus average for a product
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewSummary {
    pub average_rating: Option<f64>,
    pub review_count: i64,
    /// Counts for 1..=5 stars, index 0 is one star
    pub distribution: [i64; 5],
}

impl ReviewSummary {
    pub fn from_ratings(ratings: &[i16]) -> Self {
        let mut distribution = [0i64; 5];
        for &r in ratings {
            if (1..=5).contains(&r) {
                distribution[(r - 1) as usize] += 1;
            }
        }
        let review_count: i64 = distribution.iter().sum();
        let total: i64 = distribution
            .iter()
            .enumerate()
            .map(|(i, n)| (i as i64 + 1) * n)
            .sum();
        let average_rating = (review_count > 0)
            .then(|| ((total as f64 / review_count as f64) * 10.0).round() / 10.0);

        Self {
            average_rating,
            review_count,
            distribution,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReviews {
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rounds_to_one_decimal() {
        let summary = ReviewSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.average_rating, Some(4.3));
        assert_eq!(summary.distribution, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn empty_summary_has_no_average() {
        let summary = ReviewSummary::from_ratings(&[]);
        assert_eq!(summary.average_rating, None);
        assert_eq!(summary.review_count, 0);
    }
}
