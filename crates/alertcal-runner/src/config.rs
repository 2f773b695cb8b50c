use anyhow::{Context, Result};
use alertcal_feed::{parse_timezone, FeedFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub snapshot: SnapshotConfig,
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Route id of the line of interest.
    pub line: String,
    pub entity_type: String,
    pub alert_type: String,
    pub language: String,
    /// IANA zone used for window boundaries.
    pub timezone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub root: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Save the snapshot after every mutating action, not only at the end of the run.
    #[serde(default = "default_true")]
    pub checkpoint_each_action: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { checkpoint_each_action: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                line: "L".to_string(),
                entity_type: "planned_work".to_string(),
                alert_type: "Planned - Part Suspended".to_string(),
                language: "en".to_string(),
                timezone: "America/New_York".to_string(),
            },
            snapshot: SnapshotConfig { path: ".alertcal/snapshot.db".to_string() },
            calendar: CalendarConfig { root: ".alertcal/calendar".to_string() },
            run: RunConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse alertcal.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn feed_filter(&self) -> Result<FeedFilter> {
        Ok(FeedFilter {
            entity_type: self.feed.entity_type.clone(),
            alert_type: self.feed.alert_type.clone(),
            route: self.feed.line.clone(),
            language: self.feed.language.clone(),
            timezone: parse_timezone(&self.feed.timezone)?,
        })
    }

    pub fn snapshot_path(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.snapshot.path)
    }

    pub fn calendar_root(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.calendar.root)
    }

    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(".alertcal").join("alertcal.toml")
    }
}

fn resolve(base_dir: &Path, p: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(p).to_string());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}
