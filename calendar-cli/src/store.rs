use std::path::{Path, PathBuf};

use async_trait::async_trait;

use calendar_core::{Error, Event, Result, store::EventStore};

const STORE_FILE: &str = "events.json";

/// Base events kept as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create data directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self { path })
    }

    pub fn with_default_path(app_name: &str) -> Result<Self> {
        let data_dir = Self::get_default_data_dir(app_name)?;
        Self::new(data_dir.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_default_data_dir(app_name: &str) -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(home) = std::env::var_os("HOME") {
                Ok(PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join(app_name))
            } else {
                Err(Error::Config("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Some(data_dir) = std::env::var_os("XDG_DATA_HOME") {
                Ok(PathBuf::from(data_dir).join(app_name))
            } else if let Some(home) = std::env::var_os("HOME") {
                Ok(PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join(app_name))
            } else {
                Err(Error::Config("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(target_os = "windows")]
        {
            if let Some(app_data) = std::env::var_os("APPDATA") {
                Ok(PathBuf::from(app_data).join(app_name))
            } else {
                Err(Error::Config("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            Err(Error::Config(
                "Unsupported operating system for data directory detection".to_string(),
            ))
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl EventStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Event>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read(&self.path).await?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let events: Vec<Event> = serde_json::from_slice(&content)?;
        tracing::debug!("Loaded {} events from {}", events.len(), self.path.display());
        Ok(events)
    }

    async fn save(&self, events: &[Event]) -> Result<()> {
        let content = serde_json::to_vec_pretty(events)?;

        // Write a sibling file, then rename it over the target
        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("Saved {} events to {}", events.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_core::EventDraft;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("event-calendar-test-{}", std::process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let store = JsonFileStore::new(scratch_path("missing.json")).unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_events_load_back() {
        let path = scratch_path("saved.json");
        let store = JsonFileStore::new(path.clone()).unwrap();

        let draft = EventDraft::new(
            "Standup",
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        );
        let event = Event::from_draft("standup", draft, Utc::now());

        store.save(std::slice::from_ref(&event)).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![event]);
        assert!(!store.temp_path().exists());

        let _ = tokio::fs::remove_file(path).await;
    }
}
