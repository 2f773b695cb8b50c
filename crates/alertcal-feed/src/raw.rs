//! Wire shape of the subway-alerts JSON feed (GTFS-realtime alerts plus the mercury extension).
//! Fields the normalizer does not read are left out.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedPayload {
    #[serde(default)]
    pub header: Option<serde_json::Value>,
    #[serde(default)]
    pub entity: Vec<RawEntity>,
}

/// The alert body stays untyped until the entity passes the type filter,
/// so other entity kinds never have to match `RawAlert`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEntity {
    pub id: String,
    #[serde(default)]
    pub alert: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAlert {
    #[serde(default)]
    pub active_period: Vec<RawPeriod>,
    #[serde(default)]
    pub header_text: Option<RawTranslatedString>,
    #[serde(default)]
    pub description_text: Option<RawTranslatedString>,
}

/// Just enough of an alert to decide whether it is in scope.
/// Everything else is parsed only for alerts that pass the filters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAlertScope {
    #[serde(default)]
    pub informed_entity: Vec<RawInformedEntity>,
    #[serde(rename = "transit_realtime.mercury_alert", default)]
    pub mercury: Option<RawMercuryAlert>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawPeriod {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawInformedEntity {
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub stop_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTranslatedString {
    #[serde(default)]
    pub translation: Vec<RawTranslation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTranslation {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl RawTranslatedString {
    pub fn text_for(&self, language: &str) -> Option<&str> {
        self.translation
            .iter()
            .find(|t| t.language.as_deref() == Some(language))
            .map(|t| t.text.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawMercuryAlert {
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub display_before_active: Option<i64>,
}
