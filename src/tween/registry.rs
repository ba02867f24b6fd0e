//! Process-wide collection of live tween channels.
//!
//! Channels are stored in a [`SlotMap`] and ticked in insertion order.
//! The order affects nothing observable (channels are independent) but a
//! stable order keeps tests deterministic. The channel list is only
//! mutated between frame ticks, never from inside one.

use slotmap::{SlotMap, new_key_type};

use crate::tween::channel::TweenChannel;

new_key_type! {
    /// Stable handle to a registered channel.
    pub struct ChannelKey;
}

/// Registry of live tween channels, advanced once per frame.
#[derive(Debug)]
pub struct TweenRegistry<E> {
    channels: SlotMap<ChannelKey, TweenChannel<E>>,
    /// Insertion order for deterministic ticking.
    order: Vec<ChannelKey>,
}

impl<E> Default for TweenRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TweenRegistry<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Registers a channel and returns its key.
    pub fn register(&mut self, channel: TweenChannel<E>) -> ChannelKey {
        let key = self.channels.insert(channel);
        self.order.push(key);
        key
    }

    #[must_use]
    pub fn get(&self, key: ChannelKey) -> Option<&TweenChannel<E>> {
        self.channels.get(key)
    }

    #[must_use]
    pub fn get_mut(&mut self, key: ChannelKey) -> Option<&mut TweenChannel<E>> {
        self.channels.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: ChannelKey) -> bool {
        self.channels.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Ticks all non-paused channels in insertion order.
    ///
    /// `Call` events land in `events` in the order they were reached.
    /// Returns the keys of channels whose live values changed this tick,
    /// again in insertion order.
    pub fn advance(&mut self, dt_ms: f32, events: &mut Vec<E>) -> Vec<ChannelKey> {
        let mut changed = Vec::new();
        for &key in &self.order {
            if let Some(channel) = self.channels.get_mut(key) {
                channel.tick(dt_ms, events);
                if channel.changed() {
                    changed.push(key);
                }
            }
        }
        changed
    }

    /// Removes every channel matching the predicate.
    ///
    /// The channel is unregistered before its queue is dropped, so no
    /// stale event can fire after cancellation; completion sources inside
    /// dropped `Call` steps settle as cancelled.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(ChannelKey) -> bool) {
        self.order.retain(|&key| {
            if predicate(key) {
                self.channels.remove(key);
                false
            } else {
                true
            }
        });
    }

    /// Removes every channel. Used by the mode controller's atomic flush.
    pub fn cancel_all(&mut self) {
        self.order.clear();
        self.channels.clear();
    }
}
