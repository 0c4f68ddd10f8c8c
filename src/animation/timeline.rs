//! Tweens and nested timelines.
//!
//! A [`Timeline`] is a tree: children are tweens, spacers, or other timelines placed at
//! offsets in the parent's local time. Each timeline carries its own labels and time-scale;
//! a child timeline with scale `s` and natural duration `d` occupies `d / s` seconds of its
//! parent.

use std::collections::BTreeMap;

use crate::{
    animation::{ease::Ease, props::Props},
    foundation::{
        core::Target,
        error::{ReelError, ReelResult},
    },
};

/// Where to place a child inside a timeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Position {
    /// Absolute local offset in seconds.
    At(f64),
    /// Offset of a named label.
    Label(String),
    /// Label offset plus a delta (may be negative).
    LabelOffset(String, f64),
    /// Start of the most recently added child plus a percentage of its span (`"<25%"`).
    PrevStartPercent(f64),
}

impl From<f64> for Position {
    fn from(t: f64) -> Self {
        Self::At(t)
    }
}

impl From<&str> for Position {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for Position {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

/// One property animation over a list of targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub targets: Vec<Target>,
    pub from: Option<Props>,
    pub to: Props,
    pub duration: f64,
    pub ease: Ease,
    pub stagger: f64, // per-target start offset
    pub repeat: u32,
    pub yoyo: bool,
}

impl Tween {
    /// Animate from whatever the targets currently show to `to`.
    pub fn to(targets: Vec<Target>, to: Props, duration: f64) -> Self {
        Self {
            targets,
            from: None,
            to,
            duration,
            ease: Ease::None,
            stagger: 0.0,
            repeat: 0,
            yoyo: false,
        }
    }

    pub fn from_to(targets: Vec<Target>, from: Props, to: Props, duration: f64) -> Self {
        Self {
            from: Some(from),
            ..Self::to(targets, to, duration)
        }
    }

    /// Zero-length tween: jump to `props` at its start.
    pub fn set(targets: Vec<Target>, props: Props) -> Self {
        Self::to(targets, props, 0.0)
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Length from the first target's start to the last target's end.
    pub fn span(&self) -> f64 {
        let n = self.targets.len().max(1);
        self.duration * f64::from(self.repeat + 1) + self.stagger * (n - 1) as f64
    }

    fn validate(&self) -> ReelResult<()> {
        if !(self.duration >= 0.0 && self.duration.is_finite()) {
            return Err(ReelError::animation(format!(
                "tween duration must be finite and >= 0 (got {})",
                self.duration
            )));
        }
        if !(self.stagger >= 0.0 && self.stagger.is_finite()) {
            return Err(ReelError::animation(format!(
                "tween stagger must be finite and >= 0 (got {})",
                self.stagger
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Tween(Tween),
    Timeline(Timeline),
    /// Empty time; only extends the parent's duration.
    Spacer(f64),
}

impl Child {
    /// Span occupied in the parent's local time.
    pub fn span(&self) -> f64 {
        match self {
            Self::Tween(t) => t.span(),
            Self::Timeline(tl) => tl.effective_duration(),
            Self::Spacer(d) => *d,
        }
    }
}

impl From<Tween> for Child {
    fn from(t: Tween) -> Self {
        Self::Tween(t)
    }
}

impl From<Timeline> for Child {
    fn from(tl: Timeline) -> Self {
        Self::Timeline(tl)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placed {
    pub start: f64,
    pub child: Child,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    name: String,
    children: Vec<Placed>,
    labels: BTreeMap<String, f64>,
    time_scale: f64,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            labels: BTreeMap::new(),
            time_scale: 1.0,
        }
    }

    /// A timeline padded to a fixed length, for overrides that work in percent units.
    pub fn fixed(name: impl Into<String>, length: f64) -> Self {
        let mut tl = Self::new(name);
        tl.children.push(Placed {
            start: 0.0,
            child: Child::Spacer(length.max(0.0)),
        });
        tl
    }

    /// Define or move a label. Labels do not extend the duration.
    pub fn add_label(&mut self, name: impl Into<String>, time: f64) {
        self.labels.insert(name.into(), time);
    }

    pub fn label(&self, name: &str) -> Option<f64> {
        self.labels.get(name).copied()
    }

    pub fn labels(&self) -> &BTreeMap<String, f64> {
        &self.labels
    }

    pub fn children(&self) -> &[Placed] {
        &self.children
    }

    pub fn resolve(&self, pos: &Position) -> ReelResult<f64> {
        let lookup = |name: &str| {
            self.label(name).ok_or_else(|| {
                ReelError::animation(format!(
                    "timeline '{}' has no label '{name}'",
                    self.name
                ))
            })
        };
        let t = match pos {
            Position::At(t) => *t,
            Position::Label(name) => lookup(name)?,
            Position::LabelOffset(name, delta) => lookup(name)? + delta,
            Position::PrevStartPercent(pct) => match self.children.last() {
                Some(prev) => prev.start + prev.child.span() * pct / 100.0,
                None => 0.0,
            },
        };
        if !t.is_finite() {
            return Err(ReelError::animation(format!(
                "timeline '{}' resolved a non-finite position",
                self.name
            )));
        }
        Ok(t.max(0.0))
    }

    /// Insert a child and return its resolved local start.
    pub fn add(&mut self, child: impl Into<Child>, pos: impl Into<Position>) -> ReelResult<f64> {
        let child = child.into();
        if let Child::Tween(t) = &child {
            t.validate()?;
        }
        let start = self.resolve(&pos.into())?;
        self.children.push(Placed { start, child });
        Ok(start)
    }

    pub fn tween(&mut self, tween: Tween, pos: impl Into<Position>) -> ReelResult<f64> {
        self.add(tween, pos)
    }

    pub fn set(
        &mut self,
        targets: Vec<Target>,
        props: Props,
        pos: impl Into<Position>,
    ) -> ReelResult<f64> {
        self.add(Tween::set(targets, props), pos)
    }

    /// Natural duration: latest child end in local (unscaled) time.
    pub fn duration(&self) -> f64 {
        self.children
            .iter()
            .map(|p| p.start + p.child.span())
            .fold(0.0, f64::max)
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f64) -> ReelResult<()> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(ReelError::animation(format!(
                "time-scale must be finite and > 0 (got {scale})"
            )));
        }
        self.time_scale = scale;
        Ok(())
    }

    /// Duration as seen by the parent, after time-scaling.
    pub fn effective_duration(&self) -> f64 {
        self.duration() / self.time_scale
    }
}
