use serde::{Deserialize, Serialize};

/// Event posted by clients to the analytics proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl AnalyticsEvent {
    /// Measurement Protocol event names: letters, digits and underscores,
    /// starting with a letter, at most 40 characters.
    pub fn has_valid_name(&self) -> bool {
        let mut chars = self.name.chars();
        let starts_alpha = chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);
        starts_alpha
            && self.name.len() <= 40
            && self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> AnalyticsEvent {
        AnalyticsEvent {
            client_id: "123.456".into(),
            name: name.into(),
            params: Default::default(),
        }
    }

    #[test]
    fn event_names_follow_measurement_rules() {
        assert!(event("add_to_cart").has_valid_name());
        assert!(!event("1st_visit").has_valid_name());
        assert!(!event("add-to-cart").has_valid_name());
        assert!(!event("").has_valid_name());
        assert!(!event(&"a".repeat(41)).has_valid_name());
    }
}
