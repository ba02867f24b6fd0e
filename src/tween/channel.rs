//! A tween channel: one animatable property bag with a timed step queue.
//!
//! A channel owns a set of live property values and a FIFO queue of steps
//! (wait, interpolate-to-target, invoke-callback). The registry advances
//! the channel once per frame; a single large time delta consumes as many
//! step completions as it covers, carrying the remainder forward, so a
//! host that paused for a while catches up in one tick.
//!
//! `To` steps capture their start values lazily at step start, never at
//! enqueue time. Queued animations therefore chain from wherever the
//! previous step actually left the values, including after a mid-flight
//! override.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::color::Color;
use crate::easing::Easing;

/// Property keys addressable inside a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    RotX,
    RotY,
    RotZ,
    Color,
    /// Float-cycle z-offset, composed additively with the position channel.
    Offset,
    X,
    Y,
    Z,
    Opacity,
    Intensity,
}

/// A single animatable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(f32),
    Color(Color),
}

impl Value {
    /// Linear interpolation between two values of the same kind.
    ///
    /// Colors interpolate component-wise in RGB and clamp; a kind mismatch
    /// (which indicates a caller bug) snaps to the target.
    #[must_use]
    pub fn lerp(start: Self, end: Self, t: f32) -> Self {
        match (start, end) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a + (b - a) * t),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(b, t)),
            (_, end) => end,
        }
    }

    /// Reads the scalar payload, or `fallback` for color values.
    #[must_use]
    pub fn scalar_or(self, fallback: f32) -> f32 {
        match self {
            Value::Scalar(v) => v,
            Value::Color(_) => fallback,
        }
    }
}

/// Target list for a `To` step. Most steps touch three rotation axes and
/// a color, so four slots stay inline.
pub type Targets = SmallVec<[(Prop, Value); 4]>;

/// An interpolation step: targets, duration in milliseconds, easing.
#[derive(Debug, Clone)]
pub struct ToSpec {
    pub targets: Targets,
    pub duration: f32,
    pub easing: Easing,
}

/// A queued unit of channel work.
#[derive(Debug)]
pub enum Step<E> {
    /// Idle for the given duration (milliseconds).
    Wait(f32),
    /// Interpolate the touched values toward their targets.
    To(ToSpec),
    /// Emit an event, once, when reached.
    Call(E),
}

#[derive(Debug)]
enum Active {
    Wait {
        duration: f32,
    },
    To {
        spec: ToSpec,
        /// Start values captured when the step began.
        start: Targets,
    },
}

impl Active {
    fn duration(&self) -> f32 {
        match self {
            Active::Wait { duration } => *duration,
            Active::To { spec, .. } => spec.duration,
        }
    }
}

/// One interpolatable property bag with its own timed step queue.
///
/// Generic over the event payload `E` carried by `Call` steps; the wall
/// instantiates it with its internal event enum, tests with their own.
#[derive(Debug)]
pub struct TweenChannel<E> {
    current: FxHashMap<Prop, Value>,
    queue: VecDeque<Step<E>>,
    active: Option<Active>,
    /// Elapsed time within the active step.
    cursor: f32,
    paused: bool,
    changed: bool,
}

impl<E> Default for TweenChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TweenChannel<E> {
    /// Creates an empty, paused channel. A channel that is never resumed
    /// does not tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: FxHashMap::default(),
            queue: VecDeque::new(),
            active: None,
            cursor: 0.0,
            paused: true,
            changed: false,
        }
    }

    /// Appends a `Wait` step.
    pub fn wait(&mut self, duration_ms: f32) -> &mut Self {
        self.queue.push_back(Step::Wait(duration_ms.max(0.0)));
        self
    }

    /// Appends a `To` step. Start values are captured at step start.
    pub fn to(&mut self, targets: Targets, duration_ms: f32, easing: Easing) -> &mut Self {
        self.queue.push_back(Step::To(ToSpec {
            targets,
            duration: duration_ms.max(0.0),
            easing,
        }));
        self
    }

    /// Appends a `Call` step.
    pub fn call(&mut self, event: E) -> &mut Self {
        self.queue.push_back(Step::Call(event));
        self
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when there is no active step and the queue is empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Reads a live value.
    #[must_use]
    pub fn value(&self, prop: Prop) -> Option<Value> {
        self.current.get(&prop).copied()
    }

    /// Reads a live scalar value, falling back when absent or non-scalar.
    #[must_use]
    pub fn scalar(&self, prop: Prop, fallback: f32) -> f32 {
        self.value(prop).map_or(fallback, |v| v.scalar_or(fallback))
    }

    /// Seeds a live value without animating. Used when a channel is first
    /// created so the initial `To` has something to chain from.
    pub fn set_value(&mut self, prop: Prop, value: Value) {
        self.current.insert(prop, value);
    }

    /// Drops the active step and every queued step. Live values keep
    /// whatever they currently hold, so a follow-up `To` stays continuous.
    /// Dropped `Call` events cancel their completion sources on drop.
    pub fn replace_queue(&mut self) {
        self.active = None;
        self.cursor = 0.0;
        self.queue.clear();
    }

    /// Redirects the channel toward new targets without waiting for queue
    /// order: the active step is truncated and a fresh `To` starts from
    /// the current interpolated values, which guarantees continuous
    /// motion. Queued steps behind the active one are preserved.
    pub fn override_immediate(&mut self, targets: Targets, duration_ms: f32, easing: Easing) {
        let start = self.capture_start(&targets);
        self.active = Some(Active::To {
            spec: ToSpec {
                targets,
                duration: duration_ms.max(0.0),
                easing,
            },
            start,
        });
        self.cursor = 0.0;
    }

    /// True if any live value changed during the last tick.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }

    fn capture_start(&self, targets: &Targets) -> Targets {
        targets
            .iter()
            .map(|(prop, target)| (*prop, self.current.get(prop).copied().unwrap_or(*target)))
            .collect()
    }

    /// Advances the channel by `dt_ms`, emitting `Call` events in order.
    ///
    /// While the cursor exceeds the active step's duration the step is
    /// consumed and the remainder carries over, so several steps can
    /// complete within one tick.
    pub(crate) fn tick(&mut self, dt_ms: f32, events: &mut Vec<E>) {
        self.changed = false;
        if self.paused {
            return;
        }

        let mut remaining = dt_ms;
        loop {
            if self.active.is_none() {
                match self.queue.pop_front() {
                    None => break,
                    Some(Step::Wait(duration)) => {
                        self.active = Some(Active::Wait { duration });
                        self.cursor = 0.0;
                    }
                    Some(Step::To(spec)) => {
                        let start = self.capture_start(&spec.targets);
                        self.active = Some(Active::To { spec, start });
                        self.cursor = 0.0;
                    }
                    Some(Step::Call(event)) => {
                        events.push(event);
                        continue;
                    }
                }
            }

            let duration = self.active.as_ref().map_or(0.0, Active::duration);
            self.cursor += remaining;

            if self.cursor >= duration {
                remaining = self.cursor - duration;
                if let Some(Active::To { spec, .. }) = self.active.take() {
                    for (prop, target) in &spec.targets {
                        self.write(*prop, *target);
                    }
                }
                self.cursor = 0.0;
                continue;
            }

            if let Some(Active::To { spec, start }) = &self.active {
                let progress = spec.easing.apply((self.cursor / duration).clamp(0.0, 1.0));
                let updates: Targets = start
                    .iter()
                    .zip(spec.targets.iter())
                    .map(|((prop, from), (_, to))| (*prop, Value::lerp(*from, *to, progress)))
                    .collect();
                for (prop, value) in updates {
                    self.write(prop, value);
                }
            }
            break;
        }
    }

    fn write(&mut self, prop: Prop, value: Value) {
        if self.current.get(&prop) != Some(&value) {
            self.current.insert(prop, value);
            self.changed = true;
        }
    }
}
