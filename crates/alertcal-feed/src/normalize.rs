use std::path::Path;

use alertcal_core::{ActiveWindow, AlertKey, AlertRecord, InputError, LocalizedText};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info};

use crate::raw::{FeedPayload, RawAlert, RawAlertScope, RawEntity, RawTranslatedString};

/// Which feed entities are in scope and how their text and times are rendered.
#[derive(Clone, Debug)]
pub struct FeedFilter {
    pub entity_type: String,
    pub alert_type: String,
    pub route: String,
    /// Plain translations use this tag; HTML ones use `<language>-html`.
    pub language: String,
    pub timezone: Tz,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            entity_type: "planned_work".to_string(),
            alert_type: "Planned - Part Suspended".to_string(),
            route: "L".to_string(),
            language: "en".to_string(),
            timezone: chrono_tz::America::New_York,
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|e| anyhow!("unknown time zone `{}`: {}", name, e))
}

pub fn parse_payload(bytes: &[u8]) -> Result<FeedPayload> {
    let payload: FeedPayload = serde_json::from_slice(bytes).with_context(|| "parse feed payload json")?;
    Ok(payload)
}

pub fn load_feed(path: &Path) -> Result<FeedPayload> {
    let bytes = std::fs::read(path).with_context(|| format!("read feed: {}", path.display()))?;
    parse_payload(&bytes).with_context(|| format!("feed {}", path.display()))
}

/// Split `<source>:<type>:<key>`. Extra segments are ignored.
/// Ids without a type segment yield `None` and are simply out of scope.
pub fn split_entity_id(id: &str) -> Option<(&str, Option<&str>)> {
    let mut parts = id.split(':');
    let _source = parts.next()?;
    let ty = parts.next()?;
    let key = parts.next().filter(|k| !k.trim().is_empty());
    Some((ty, key))
}

/// Turn a raw payload into the in-scope alerts, in feed order.
///
/// Entities are filtered by type, then route (first informed entity), then classification.
/// Anything that passes the filters must be complete: a missing translation, timestamp,
/// or window bound fails the whole batch.
pub fn normalize(payload: &FeedPayload, filter: &FeedFilter) -> Result<Vec<AlertRecord>, InputError> {
    let mut out = Vec::new();
    for entity in &payload.entity {
        if let Some(record) = normalize_entity(entity, filter)? {
            out.push(record);
        }
    }
    info!(
        entities = payload.entity.len(),
        alerts = out.len(),
        route = %filter.route,
        "parsed alerts from feed"
    );
    Ok(out)
}

fn normalize_entity(entity: &RawEntity, filter: &FeedFilter) -> Result<Option<AlertRecord>, InputError> {
    let Some((ty, key)) = split_entity_id(&entity.id) else {
        debug!(id = %entity.id, "skipping entity without a type segment");
        return Ok(None);
    };
    if ty != filter.entity_type {
        return Ok(None);
    }
    let key = key.ok_or_else(|| InputError::MalformedEntityId(entity.id.clone()))?;

    let alert_value = entity.alert.as_ref().ok_or_else(|| malformed(&entity.id, "missing alert body"))?;
    let scope = RawAlertScope::deserialize(alert_value).map_err(|e| malformed(&entity.id, &format!("alert scope: {e}")))?;

    let route = scope.informed_entity.first().and_then(|ie| ie.route_id.as_deref());
    if route != Some(filter.route.as_str()) {
        debug!(id = %entity.id, ?route, "skipping alert for another route");
        return Ok(None);
    }
    let mercury = scope
        .mercury
        .as_ref()
        .ok_or_else(|| malformed(&entity.id, "missing transit_realtime.mercury_alert"))?;
    let kind = mercury.alert_type.as_deref().unwrap_or_default();
    if kind != filter.alert_type {
        debug!(id = %entity.id, kind, "skipping alert of another classification");
        return Ok(None);
    }

    let alert = RawAlert::deserialize(alert_value).map_err(|e| malformed(&entity.id, &format!("alert body: {e}")))?;
    let updated_at = mercury
        .updated_at
        .ok_or_else(|| malformed(&entity.id, "missing updated_at"))
        .and_then(|secs| utc(&entity.id, secs))?;
    let created_at = mercury.created_at.map(|secs| utc(&entity.id, secs)).transpose()?;

    let mut active_windows = Vec::with_capacity(alert.active_period.len());
    for (index, period) in alert.active_period.iter().enumerate() {
        let (Some(start), Some(end)) = (period.start, period.end) else {
            return Err(malformed(&entity.id, &format!("active_period[{index}] is missing a bound")));
        };
        active_windows.push(ActiveWindow::new(
            local(&entity.id, start, &filter.timezone)?,
            local(&entity.id, end, &filter.timezone)?,
        ));
    }

    let record = AlertRecord {
        key: AlertKey::from_str(key),
        kind: kind.to_string(),
        route: filter.route.clone(),
        created_at,
        updated_at,
        active_windows,
        title: localized(&entity.id, "header_text", alert.header_text.as_ref(), &filter.language)?,
        body: localized(&entity.id, "description_text", alert.description_text.as_ref(), &filter.language)?,
    };
    record.validate()?;
    Ok(Some(record))
}

fn localized(
    id: &str,
    field: &'static str,
    text: Option<&RawTranslatedString>,
    language: &str,
) -> Result<LocalizedText, InputError> {
    let html_language = format!("{language}-html");
    let pick = |lang: &str| {
        text.and_then(|t| t.text_for(lang))
            .map(str::to_string)
            .ok_or_else(|| InputError::MissingTranslation {
                id: id.to_string(),
                field,
                language: lang.to_string(),
            })
    };
    Ok(LocalizedText { plain: pick(language)?, html: pick(&html_language)? })
}

fn utc(id: &str, secs: i64) -> Result<DateTime<Utc>, InputError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| InputError::TimestampOutOfRange { id: id.to_string(), value: secs })
}

fn local(id: &str, secs: i64, tz: &Tz) -> Result<DateTime<FixedOffset>, InputError> {
    Ok(utc(id, secs)?.with_timezone(tz).fixed_offset())
}

fn malformed(id: &str, reason: &str) -> InputError {
    InputError::MalformedEntity { id: id.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_rule() {
        assert_eq!(split_entity_id("lmm:planned_work:1001"), Some(("planned_work", Some("1001"))));
        assert_eq!(split_entity_id("lmm:planned_work:1001:extra"), Some(("planned_work", Some("1001"))));
        assert_eq!(split_entity_id("lmm:planned_work"), Some(("planned_work", None)));
        assert_eq!(split_entity_id("lmm:planned_work:"), Some(("planned_work", None)));
        assert_eq!(split_entity_id("opaque"), None);
    }

    #[test]
    fn timezone_names() {
        assert!(parse_timezone("America/New_York").is_ok());
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }
}
