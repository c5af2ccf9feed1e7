use std::path::{Path, PathBuf};
use thiserror::Error;

/// Small persisted state carried between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppPrefs {
    pub last_scene: Option<String>,
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl AppPrefs {
    /// Load from `path`. A missing file (or no path) yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PrefsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PrefsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, PrefsError> {
        let mut prefs = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(PrefsError::Parse {
                    line: line_idx + 1,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            // Unknown keys are ignored so older builds can read newer files.
            if key.trim() == "last_scene" {
                let value = value.trim();
                prefs.last_scene = (!value.is_empty()).then(|| value.to_string());
            }
        }
        Ok(prefs)
    }

    pub fn to_text(&self) -> String {
        let mut body = String::from("# beatscope prefs v1\n");
        if let Some(scene) = &self.last_scene {
            body.push_str("last_scene=");
            body.push_str(scene.lines().next().unwrap_or_default().trim());
            body.push('\n');
        }
        body
    }

    /// Write atomically (temp file, then rename). No path means no-op.
    pub fn save(&self, path: Option<&Path>) -> Result<(), PrefsError> {
        let Some(path) = path else {
            return Ok(());
        };
        let io_err = |source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }
}

pub fn prefs_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("beatscope").join("prefs.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("beatscope")
            .join("prefs.txt"),
    )
}
