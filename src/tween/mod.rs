//! Tweening subsystem: channels, the per-frame registry, and completion
//! signals.

pub mod channel;
pub mod registry;
pub mod signal;

pub use channel::{Prop, Step, Targets, ToSpec, TweenChannel, Value};
pub use registry::{ChannelKey, TweenRegistry};
pub use signal::{Completion, CompletionSource, SignalState};
