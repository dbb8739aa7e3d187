//! CoCreate Core Library
//!
//! Platform-agnostic drawing tile: raster, undo history, edge exchange and
//! local persistence. The UI shell lives in `cocreate-app`.

pub mod canvas;
pub mod codec;
pub mod config;
pub mod controller;
pub mod edges;
pub mod history;
pub mod input;
pub mod overlay;
pub mod persistence;
pub mod raster;
pub mod room;
pub mod storage;
pub mod text;
pub mod tools;

pub use canvas::Canvas;
pub use codec::CodecError;
pub use config::{ConfigError, TileConfig};
pub use controller::{ClipboardError, ClipboardSink, DrawState, ExportedImage, InteractionController};
pub use edges::{EdgeBundle, EdgeError, Side};
pub use history::History;
pub use input::PointerEvent;
pub use overlay::{GridSpacing, Overlay};
pub use persistence::{RestoreOutcome, SessionTileStore, TileStore, open_session_store};
pub use raster::{Raster, Snapshot};
pub use room::RoomId;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use text::{BlockRasterizer, FontRasterizer, TextRasterizer};
pub use tools::{Brush, Color, ToolKind};
