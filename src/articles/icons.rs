// src/articles/icons.rs
//! Section icons: a closed set with a guaranteed default.
//!
//! Authored content names icons by free-form strings ("MapPin", "map-pin",
//! "shield_check"). Anything unrecognized resolves to [`IconKey::Info`].

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconKey {
    #[default]
    Info,
    Leaf,
    MapPin,
    Shield,
    Alert,
    Heart,
    Star,
    Clock,
    Scale,
    Home,
    Car,
    Utensils,
    Mountain,
    Sparkles,
}

impl IconKey {
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "info" | "book" | "bookopen" => IconKey::Info,
            "leaf" | "cannabis" | "sprout" => IconKey::Leaf,
            "mappin" | "map" | "pin" | "location" => IconKey::MapPin,
            "shield" | "shieldcheck" | "safety" => IconKey::Shield,
            "alert" | "alerttriangle" | "warning" | "alertcircle" => IconKey::Alert,
            "heart" | "health" => IconKey::Heart,
            "star" | "award" => IconKey::Star,
            "clock" | "time" | "hours" => IconKey::Clock,
            "scale" | "law" | "legal" | "gavel" => IconKey::Scale,
            "home" | "hotel" | "bed" => IconKey::Home,
            "car" | "transport" | "travel" => IconKey::Car,
            "utensils" | "food" | "dining" => IconKey::Utensils,
            "mountain" | "outdoors" | "hiking" => IconKey::Mountain,
            "sparkles" | "tips" => IconKey::Sparkles,
            _ => {
                if !key.is_empty() {
                    tracing::debug!(target: "articles", icon = name, "unknown icon; using default");
                }
                IconKey::default()
            }
        }
    }
}

impl<'de> Deserialize<'de> for IconKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().map(IconKey::from_name).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        assert_eq!(IconKey::from_name("MapPin"), IconKey::MapPin);
        assert_eq!(IconKey::from_name("map-pin"), IconKey::MapPin);
        assert_eq!(IconKey::from_name("shield_check"), IconKey::Shield);
        assert_eq!(IconKey::from_name(" AlertTriangle "), IconKey::Alert);
    }

    #[test]
    fn unknown_names_fall_back_to_default() {
        assert_eq!(IconKey::from_name("unicorn"), IconKey::Info);
        assert_eq!(IconKey::from_name(""), IconKey::Info);
        let k: IconKey = serde_json::from_str("\"nope\"").unwrap();
        assert_eq!(k, IconKey::Info);
        let k: IconKey = serde_json::from_str("null").unwrap();
        assert_eq!(k, IconKey::Info);
    }

    #[test]
    fn serializes_as_kebab_case() {
        assert_eq!(serde_json::to_string(&IconKey::MapPin).unwrap(), "\"map-pin\"");
    }
}
