//! Command-line arguments.

use clap::Parser;
use cocreate_core::config::{CONFIG_FILE_NAME, TileConfig};
use cocreate_core::room::{self, RoomId};
use cocreate_core::storage::default_data_dir;
use std::path::{Path, PathBuf};

/// Invite link base used when none is given on the command line.
pub const DEFAULT_INVITE_BASE: &str = "cocreate://tile";

#[derive(Parser, Debug)]
#[command(name = "cocreate", version, about = "Draw one tile and trade its edges with neighbours")]
pub struct Args {
    /// Room to join; overrides the stored room.
    #[arg(long, value_name = "ID")]
    pub room: Option<String>,

    /// Invite link to join; its `room` parameter is used.
    #[arg(long, value_name = "URL")]
    pub invite: Option<String>,

    /// Directory holding the saved tile, room and config.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file [default: config.json in the data directory].
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Settings resolved from the arguments.
#[derive(Debug, Clone)]
pub struct Launch {
    pub config: TileConfig,
    pub data_dir: Option<PathBuf>,
    pub requested_room: Option<RoomId>,
    pub invite_base: String,
}

impl Args {
    /// `--room` wins over the room in `--invite`.
    pub fn requested_room(&self) -> Option<RoomId> {
        self.room
            .as_deref()
            .and_then(RoomId::parse)
            .or_else(|| self.invite.as_deref().and_then(room::room_from_invite))
    }

    pub fn invite_base(&self) -> String {
        match self.invite.as_deref() {
            Some(invite) if room::room_from_invite(invite).is_some() => invite.to_string(),
            _ => DEFAULT_INVITE_BASE.to_string(),
        }
    }

    fn load_config(&self, data_dir: Option<&Path>) -> TileConfig {
        if let Some(path) = &self.config {
            return TileConfig::load(path).unwrap_or_else(|e| {
                log::warn!("{}; using defaults", e);
                TileConfig::default()
            });
        }
        match data_dir {
            Some(dir) => TileConfig::load_or_default(&dir.join(CONFIG_FILE_NAME)),
            None => TileConfig::default(),
        }
    }

    pub fn into_launch(self) -> Launch {
        let data_dir = self.data_dir.clone().or_else(|| match default_data_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                log::warn!("No data directory: {}", e);
                None
            }
        });
        Launch {
            config: self.load_config(data_dir.as_deref()),
            requested_room: self.requested_room(),
            invite_base: self.invite_base(),
            data_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_flag_wins() {
        let args = Args::try_parse_from([
            "cocreate",
            "--room",
            "alpha",
            "--invite",
            "cocreate://tile?room=beta",
        ])
        .unwrap();
        assert_eq!(args.requested_room().unwrap().as_str(), "alpha");
        assert_eq!(args.invite_base(), "cocreate://tile?room=beta");
    }

    #[test]
    fn test_room_from_invite() {
        let args = Args::try_parse_from(["cocreate", "--invite", "https://tiles.example/?room=beta"]).unwrap();
        assert_eq!(args.requested_room().unwrap().as_str(), "beta");
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["cocreate"]).unwrap();
        assert!(args.requested_room().is_none());
        assert_eq!(args.invite_base(), DEFAULT_INVITE_BASE);
    }

    #[test]
    fn test_config_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "brush_width": 12 }"#).unwrap();

        let args = Args::try_parse_from(["cocreate", "--data-dir", dir.path().to_str().unwrap()]).unwrap();
        let launch = args.into_launch();
        assert_eq!(launch.config.brush_width, 12);
        assert_eq!(launch.data_dir.as_deref(), Some(dir.path()));
    }
}
