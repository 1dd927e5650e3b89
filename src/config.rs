use crate::events::HostEvent;
use crate::slot::ImagePath;
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::Path;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

pub const SLOT_COUNT: usize = 6;

/// The six fixed slots, in position order. `LeftTop` is the enlarged one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[strum(serialize = "LeftTop", serialize = "lt", serialize = "0")]
    LeftTop,
    #[strum(serialize = "RightTop", serialize = "rt", serialize = "1")]
    RightTop,
    #[strum(serialize = "RightMiddle", serialize = "rm", serialize = "2")]
    RightMiddle,
    #[strum(serialize = "RightBottom", serialize = "rb", serialize = "3")]
    RightBottom,
    #[strum(serialize = "MiddleBottom", serialize = "mb", serialize = "4")]
    MiddleBottom,
    #[strum(serialize = "LeftBottom", serialize = "lb", serialize = "5")]
    LeftBottom,
}

impl Position {
    pub const ALL: [Position; SLOT_COUNT] = [
        Position::LeftTop,
        Position::RightTop,
        Position::RightMiddle,
        Position::RightBottom,
        Position::MiddleBottom,
        Position::LeftBottom,
    ];

    pub fn as_index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn prev(&self) -> Option<Self> {
        self.as_index().checked_sub(1).and_then(Self::from_index)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub density: f64,
    pub layout_radius_dp: f64,
    pub big_radius_dp: f64,
    pub small_radius_dp: f64,
    /// Draw the five outer slots at the big slot's size.
    pub uniform_slots: bool,
    pub touch_slop: f64,
    pub drag_sensitivity: f64,
    pub intercept_time_slop_ms: u64,
    pub hold_delay_ms: u64,
    pub ready_scale: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            layout_radius_dp: 100.0,
            big_radius_dp: 40.0,
            small_radius_dp: 23.0,
            uniform_slots: true,
            touch_slop: 8.0,
            drag_sensitivity: 10.0,
            intercept_time_slop_ms: 200,
            hold_delay_ms: 200,
            ready_scale: 0.9,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotConfig {
    pub position: Option<Position>,
    pub image: Option<ImagePath>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "stone", "dragsquare").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(
            config::Environment::with_prefix("DRAGSQUARE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Falling back to default config: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<std::path::PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");


/// Whether a watcher event touches the config file itself.
fn is_config_change(event: &notify::Event, config_path: &Path) -> bool {
    let touches_file = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    );
    touches_file && event.paths.iter().any(|p| p == config_path)
}

/// Posts [`HostEvent::ConfigReload`] whenever `config.toml` changes. Watches
/// the parent directory so editors that replace the file are seen too.
pub async fn run_async_watcher(tx: Sender<HostEvent>) {
    let Some((config_path, config_dir)) = get_config_path()
        .inspect_err(|e| log::error!("Config watcher disabled: {}", e))
        .ok()
        .and_then(|path| Some((path.clone(), path.parent()?.to_path_buf())))
    else {
        return;
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Cannot create {}: {}", config_dir.display(), e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    );
    let mut watcher = match watcher {
        Ok(w) => w,
        Err(e) => {
            log::error!("Config watcher disabled: {}", ConfigError::from(e));
            return;
        }
    };
    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Cannot watch {}: {}", config_dir.display(), e);
        return;
    }
    log::debug!("Watching {}", config_path.display());

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) if is_config_change(&event, &config_path) => {
                log::debug!("{} changed", config_path.display());
                if tx.send(HostEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Config watch error: {}", e),
        }
    }
}
