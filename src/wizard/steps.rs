//! Step catalogs and per-step rules for seller onboarding and product creation.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

use super::{StepConfig, StepRules};
use crate::validation::{as_number, is_empty, FieldRules, RuleSet};

pub const BASIC_DETAILS: &str = "basic_details";
pub const SHOP_TIMING: &str = "shop_timing";
pub const DOCUMENT_VERIFICATION: &str = "document_verification";

pub const BASIC_INFO: &str = "basic_info";
pub const PRICING: &str = "pricing";
pub const TECHNICAL_DETAILS: &str = "technical_details";
pub const IMAGES_GST: &str = "images_gst";
pub const REVIEW: &str = "review";

pub const GST_RATES: [&str; 5] = ["0", "5", "12", "18", "28"];
pub const WEEK_DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];
pub const MAX_PRODUCT_IMAGES: usize = 8;

static PHONE: OnceLock<Regex> = OnceLock::new();
static PINCODE: OnceLock<Regex> = OnceLock::new();
static GSTIN: OnceLock<Regex> = OnceLock::new();
static TIME: OnceLock<Regex> = OnceLock::new();
static HSN: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

pub fn phone_regex() -> &'static Regex {
    compiled(&PHONE, r"^[6-9]\d{9}$")
}

pub fn pincode_regex() -> &'static Regex {
    compiled(&PINCODE, r"^\d{6}$")
}

fn gstin_regex() -> &'static Regex {
    compiled(&GSTIN, r"^\d{2}[A-Z]{5}\d{4}[A-Z][1-9A-Z]Z[0-9A-Z]$")
}

fn time_regex() -> &'static Regex {
    compiled(&TIME, r"^([01]\d|2[0-3]):[0-5]\d$")
}

fn hsn_regex() -> &'static Regex {
    compiled(&HSN, r"^\d{4,8}$")
}

/// Onboarding steps used when the configuration table is empty.
pub fn default_onboarding_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new(BASIC_DETAILS, "Basic Details", 1, true),
        StepConfig::new(SHOP_TIMING, "Shop Timing", 2, true),
        StepConfig::new(DOCUMENT_VERIFICATION, "Document Verification", 3, true),
    ]
}

/// Product creation steps. These are fixed; only onboarding is configurable.
pub fn product_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new(BASIC_INFO, "Basic Information", 1, true),
        StepConfig::new(PRICING, "Pricing & Stock", 2, true),
        StepConfig::new(TECHNICAL_DETAILS, "Technical Details", 3, false),
        StepConfig::new(IMAGES_GST, "Images & GST", 4, true),
        StepConfig::new(REVIEW, "Review", 5, true),
    ]
}

/// Rules for seller onboarding. Document verification needs the ids of the
/// document types currently marked as required.
#[derive(Debug, Clone, Default)]
pub struct OnboardingRules {
    pub required_document_types: Vec<Uuid>,
}

impl OnboardingRules {
    pub fn new(required_document_types: Vec<Uuid>) -> Self {
        Self {
            required_document_types,
        }
    }
}

impl StepRules for OnboardingRules {
    fn rules_for(&self, step_key: &str) -> RuleSet {
        match step_key {
            BASIC_DETAILS => basic_details_rules(),
            SHOP_TIMING => shop_timing_rules(),
            DOCUMENT_VERIFICATION => document_rules(self.required_document_types.clone()),
            _ => RuleSet::new(),
        }
    }
}

fn basic_details_rules() -> RuleSet {
    RuleSet::new()
        .field(
            FieldRules::new("shop_name", "Shop name")
                .required()
                .min_length(3)
                .max_length(100),
        )
        .field(FieldRules::new("category", "Shop category").required())
        .field(
            FieldRules::new("phone", "Phone number")
                .required()
                .pattern(phone_regex(), "Enter a valid 10-digit mobile number"),
        )
        .field(FieldRules::new("address", "Address").required().min_length(5))
        .field(FieldRules::new("city", "City").required())
        .field(FieldRules::new("state", "State").required())
        .field(
            FieldRules::new("pincode", "Pincode")
                .required()
                .pattern(pincode_regex(), "Enter a valid 6-digit pincode"),
        )
        .field(
            FieldRules::new("gst_number", "GST number")
                .pattern(gstin_regex(), "Enter a valid 15-character GSTIN"),
        )
}

fn shop_timing_rules() -> RuleSet {
    RuleSet::new()
        .field(
            FieldRules::new("opening_time", "Opening time")
                .required()
                .pattern(time_regex(), "Use 24-hour HH:MM format"),
        )
        .field(
            FieldRules::new("closing_time", "Closing time")
                .required()
                .pattern(time_regex(), "Use 24-hour HH:MM format")
                .custom(|closing, form| {
                    let opening = form.get("opening_time")?.as_str()?;
                    let closing = closing.as_str()?;
                    // HH:MM compares correctly as text
                    (closing <= opening)
                        .then(|| "Closing time must be after opening time".to_string())
                }),
        )
        .field(
            FieldRules::new("working_days", "Working days")
                .required()
                .custom(|days, _| {
                    let days = days.as_array()?;
                    let unknown = days.iter().any(|d| {
                        d.as_str()
                            .map(|d| !WEEK_DAYS.contains(&d.to_lowercase().as_str()))
                            .unwrap_or(true)
                    });
                    unknown.then(|| "Working days must be names of the week".to_string())
                }),
        )
}

fn document_rules(required_types: Vec<Uuid>) -> RuleSet {
    RuleSet::new().field(
        FieldRules::new("documents", "Documents")
            .required()
            .custom(|docs, _| {
                let docs = docs.as_array()?;
                let malformed = docs.iter().any(|d| {
                    document_type_of(d).is_none()
                        || d.get("file_url").map(is_empty).unwrap_or(true)
                });
                malformed.then(|| "Each document needs a type and an uploaded file".to_string())
            })
            .custom(move |docs, _| {
                let provided: Vec<Uuid> = docs
                    .as_array()?
                    .iter()
                    .filter_map(document_type_of)
                    .collect();
                let missing = required_types.iter().filter(|t| !provided.contains(t)).count();
                (missing > 0).then(|| format!("{} required document(s) missing", missing))
            }),
    )
}

fn document_type_of(doc: &Value) -> Option<Uuid> {
    doc.get("document_type_id")?.as_str()?.parse().ok()
}

/// Rules for step-wise product creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRules;

impl StepRules for ProductRules {
    fn rules_for(&self, step_key: &str) -> RuleSet {
        match step_key {
            BASIC_INFO => RuleSet::new()
                .field(
                    FieldRules::new("name", "Product name")
                        .required()
                        .min_length(3)
                        .max_length(200),
                )
                .field(
                    FieldRules::new("description", "Description")
                        .required()
                        .min_length(10)
                        .max_length(5000),
                )
                .field(FieldRules::new("category_id", "Category").required()),
            PRICING => RuleSet::new()
                .field(FieldRules::new("price", "Price").required().min(0.01))
                .field(
                    FieldRules::new("mrp", "MRP")
                        .min(0.0)
                        .custom(|mrp, form| {
                            let mrp = as_number(mrp)?;
                            let price = as_number(form.get("price")?)?;
                            (mrp < price).then(|| "MRP cannot be lower than the price".to_string())
                        }),
                )
                .field(
                    FieldRules::new("stock", "Stock")
                        .required()
                        .min(0.0)
                        .custom(|stock, _| {
                            let stock = as_number(stock)?;
                            (stock.fract() != 0.0)
                                .then(|| "Stock must be a whole number".to_string())
                        }),
                ),
            TECHNICAL_DETAILS => RuleSet::new().field(
                FieldRules::new("technical_details", "Technical details").custom(|rows, _| {
                    let rows = rows.as_array()?;
                    let incomplete = rows.iter().any(|row| {
                        row.get("key").map(is_empty).unwrap_or(true)
                            || row.get("value").map(is_empty).unwrap_or(true)
                    });
                    incomplete.then(|| "Each detail needs a name and a value".to_string())
                }),
            ),
            IMAGES_GST => RuleSet::new()
                .field(
                    FieldRules::new("images", "Product images")
                        .required()
                        .max_length(MAX_PRODUCT_IMAGES),
                )
                .field(
                    FieldRules::new("gst_rate", "GST rate")
                        .required()
                        .one_of(GST_RATES),
                )
                .field(
                    FieldRules::new("hsn_code", "HSN code")
                        .pattern(hsn_regex(), "HSN code must be 4 to 8 digits"),
                ),
            _ => RuleSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{StepOutcome, Wizard};
    use serde_json::json;

    #[test]
    fn basic_details_requires_core_fields() {
        let errors = OnboardingRules::default()
            .rules_for(BASIC_DETAILS)
            .validate(&json!({"shop_name": "Ab"}))
            .unwrap_err();

        for field in ["category", "phone", "address", "city", "state", "pincode"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
        assert!(errors.contains("shop_name"));
        assert!(!errors.contains("gst_number"));
    }

    #[test]
    fn basic_details_checks_formats() {
        let errors = OnboardingRules::default()
            .rules_for(BASIC_DETAILS)
            .validate(&json!({
                "shop_name": "Corner Store",
                "category": "grocery",
                "phone": "12345",
                "address": "12 Market Road",
                "city": "Pune",
                "state": "MH",
                "pincode": "4110",
                "gst_number": "27AAPFU0939F1ZV"
            }))
            .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.contains("phone"));
        assert!(errors.contains("pincode"));
    }

    #[test]
    fn closing_time_must_follow_opening() {
        let rules = OnboardingRules::default().rules_for(SHOP_TIMING);

        let errors = rules
            .validate(&json!({
                "opening_time": "18:00",
                "closing_time": "09:00",
                "working_days": ["monday"]
            }))
            .unwrap_err();
        assert!(errors.contains("closing_time"));

        assert!(rules
            .validate(&json!({
                "opening_time": "09:00",
                "closing_time": "21:30",
                "working_days": ["Monday", "tuesday"]
            }))
            .is_ok());
    }

    #[test]
    fn documents_must_cover_required_types() {
        let pan = Uuid::new_v4();
        let license = Uuid::new_v4();
        let rules = OnboardingRules::new(vec![pan, license]).rules_for(DOCUMENT_VERIFICATION);

        let errors = rules
            .validate(&json!({
                "documents": [{"document_type_id": pan.to_string(), "file_url": "/uploads/pan.pdf"}]
            }))
            .unwrap_err();
        assert_eq!(errors.get("documents").unwrap(), ["1 required document(s) missing"]);

        assert!(rules
            .validate(&json!({
                "documents": [
                    {"document_type_id": pan.to_string(), "file_url": "/uploads/pan.pdf"},
                    {"document_type_id": license.to_string(), "file_url": "/uploads/lic.pdf"}
                ]
            }))
            .is_ok());
    }

    #[test]
    fn pricing_rejects_mrp_below_price_and_fractional_stock() {
        let errors = ProductRules
            .rules_for(PRICING)
            .validate(&json!({"price": "499", "mrp": 399, "stock": 2.5}))
            .unwrap_err();

        assert!(errors.contains("mrp"));
        assert!(errors.contains("stock"));
    }

    #[test]
    fn product_wizard_allows_skipping_technical_details() {
        let mut wizard = Wizard::new(product_steps(), true, ProductRules).unwrap();

        wizard
            .advance(json!({
                "name": "Steel Bottle",
                "description": "Insulated 1L steel bottle",
                "category_id": Uuid::new_v4().to_string()
            }))
            .unwrap();
        wizard
            .advance(json!({"price": 499, "mrp": 599, "stock": 10}))
            .unwrap();

        assert_eq!(wizard.skip().unwrap(), StepOutcome::Next(IMAGES_GST.into()));

        let err = wizard.advance(json!({"images": [], "gst_rate": 7})).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains("images"));
        assert!(errors.contains("gst_rate"));

        wizard
            .advance(json!({"images": ["/uploads/a.jpg"], "gst_rate": "18", "hsn_code": "7323"}))
            .unwrap();
        assert_eq!(wizard.advance(json!({})).unwrap(), StepOutcome::Completed);
        assert_eq!(wizard.merged_data()["gst_rate"], "18");
    }
}
