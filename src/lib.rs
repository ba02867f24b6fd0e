#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod color;
pub mod director;
pub mod easing;
pub mod errors;
pub mod layout;
pub mod mode;
pub mod scene;
pub mod tiles;
pub mod tween;
pub mod wall;

pub use color::Color;
pub use director::{MoveLightOptions, RollDirection, RollOverOptions, ShakeOptions, WaveKind, WaveOptions};
pub use easing::Easing;
pub use errors::{Result, WallError};
pub use layout::{LayoutSpec, Slot};
pub use mode::Mode;
pub use scene::{BodyKey, TileTransform, WallScene};
pub use tiles::{ChannelKind, Tile, TileTable};
pub use tween::{ChannelKey, Completion, CompletionSource, SignalState, TweenChannel, TweenRegistry};
pub use wall::{DEFAULT_PRIMARY, STAGING_POINT, TileWall, WallOptions};
