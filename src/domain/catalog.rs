//! Catalog domain types: categories, brands, products, technical details, deals

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product visibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl From<String> for ProductStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Draft,
        }
    }
}

/// Category row. A category with a parent is a subcategory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Top-level category with its subcategories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Category>,
}

/// Group a flat category list into a two-level tree. Subcategories whose
/// parent is missing or inactive are dropped.
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let (roots, children): (Vec<Category>, Vec<Category>) =
        categories.into_iter().partition(|c| c.parent_id.is_none());

    roots
        .into_iter()
        .map(|root| {
            let subcategories = children
                .iter()
                .filter(|c| c.parent_id == Some(root.id))
                .cloned()
                .collect();
            CategoryNode {
                category: root,
                subcategories,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
}

/// Product listing row, joined with shop, category and rating aggregates
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub shop_name: Option<String>,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub subcategory_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub gst_rate: Decimal,
    pub hsn_code: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Discount against MRP as a whole percentage
    pub fn discount_percent(&self) -> Option<u32> {
        discount_percent(self.price, self.mrp?)
    }
}

/// Whole-percent discount of `price` against `mrp`, if any.
pub fn discount_percent(price: Decimal, mrp: Decimal) -> Option<u32> {
    if mrp <= Decimal::ZERO || price >= mrp {
        return None;
    }
    let pct = (mrp - price) * Decimal::from(100) / mrp;
    pct.floor().to_string().parse().ok()
}

/// Product detail: listing row plus technical details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percent: Option<u32>,
    pub technical_details: Vec<TechnicalDetail>,
}

/// Query params for the product listing
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProductQuery {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub seller_id: Option<Uuid>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort_by: Option<String>, // price, newest, rating, name
    #[serde(default)]
    pub sort_order: Option<String>, // asc, desc
}

impl ProductQuery {
    /// Whitelisted ORDER BY clause
    pub fn order_clause(&self) -> String {
        let column = match self.sort_by.as_deref() {
            Some("price") => "p.price",
            Some("rating") => "average_rating",
            Some("name") => "p.name",
            _ => "p.created_at",
        };
        let direction = match self.sort_order.as_deref() {
            Some("asc") => "ASC",
            Some("desc") => "DESC",
            // names read naturally ascending, everything else newest/highest first
            _ if column == "p.name" => "ASC",
            _ => "DESC",
        };
        format!("{} {} NULLS LAST", column, direction)
    }
}

/// Full product payload from the step-wise wizard (merged step data)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    pub price: Decimal,
    #[serde(default)]
    pub mrp: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub gst_rate: Decimal,
    #[serde(default)]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub technical_details: Vec<TechnicalDetail>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub mrp: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub gst_rate: Option<Decimal>,
    #[serde(default)]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

/// One step of the product wizard, validated without saving
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidateStepRequest {
    pub step: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One name/value row of a product's specification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalDetail {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalDetails {
    pub product_id: Uuid,
    pub details: Vec<TechnicalDetail>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateTechnicalDetailsRequest {
    pub details: Vec<TechnicalDetail>,
}

/// Deal shown on Today's Deals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deal {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub discount_percentage: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub product_name: String,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub images: Vec<String>,
    pub shop_name: Option<String>,
}

impl Deal {
    /// Price after the deal discount, rounded to paise
    pub fn deal_price(&self) -> Decimal {
        let factor = Decimal::from(100 - self.discount_percentage.clamp(0, 100)) / Decimal::from(100);
        (self.price * factor).round_dp(2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealResponse {
    #[serde(flatten)]
    pub deal: Deal,
    pub deal_price: Decimal,
}

impl From<Deal> for DealResponse {
    fn from(deal: Deal) -> Self {
        let deal_price = deal.deal_price();
        Self { deal, deal_price }
    }
}
