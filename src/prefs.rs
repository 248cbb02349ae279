use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Process-wide UI preferences with a load-at-init, persist-on-change
/// lifecycle. Subscribers replace the storage-polling workaround of the
/// source system: every persisted change notifies them synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPrefs {
    pub dark_mode: bool,
    pub sidebar_collapsed: bool,
}

type Subscriber = Box<dyn FnMut(&UiPrefs)>;

pub struct PrefsStore {
    path: PathBuf,
    current: UiPrefs,
    subscribers: Vec<Subscriber>,
}

impl PrefsStore {
    /// A missing or unreadable prefs file falls back to defaults; opening
    /// the app must never fail on preference state.
    pub fn load(path: &Path) -> Self {
        let current = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt prefs file");
                    UiPrefs::default()
                }
            },
            Err(_) => UiPrefs::default(),
        };
        PrefsStore {
            path: path.to_path_buf(),
            current,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> UiPrefs {
        self.current
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&UiPrefs) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Apply partial updates, persist, then notify. Subscribers only fire
    /// when something actually changed and the write succeeded.
    pub fn update(
        &mut self,
        dark_mode: Option<bool>,
        sidebar_collapsed: Option<bool>,
    ) -> anyhow::Result<UiPrefs> {
        let mut next = self.current;
        if let Some(v) = dark_mode {
            next.dark_mode = v;
        }
        if let Some(v) = sidebar_collapsed {
            next.sidebar_collapsed = v;
        }
        if next == self.current {
            return Ok(self.current);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create prefs directory {}", parent.display())
                })?;
            }
        }
        let text = serde_json::to_string_pretty(&next)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("failed to write prefs file {}", self.path.display()))?;

        self.current = next;
        for subscriber in &mut self.subscribers {
            subscriber(&next);
        }
        Ok(self.current)
    }
}
