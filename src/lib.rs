//! Rumor Reel choreographs looping, randomized text "rumors" against one master timeline.
//!
//! Each display cycle renders a record into an in-memory [`Scene`], builds word-level
//! sub-timelines per component, fits them into label windows on a master timeline and
//! re-measures the content timing into a normalized [`TimingDescriptor`]. A [`Player`]
//! drives cycles frame by frame on a virtual clock.
#![forbid(unsafe_code)]

pub mod animation;
pub mod choreo;
pub mod config;
pub mod content;
pub mod eval;
pub mod foundation;
pub mod orchestrator;
pub mod rotation;
pub mod scene;
pub mod segment;

pub use crate::animation::{
    ease::Ease,
    plan::Plan,
    playhead::{Playhead, Step},
    props::{Prop, Props, Style},
    timeline::{Position, Timeline, Tween},
};
pub use crate::choreo::{
    component::{ComponentBuilder, ComponentTimeline, rescale},
    labels::{MasterLabelSet, TimingDescriptor, Window},
    master::{ComposedCycle, Composer},
    profile::{FadeProfile, ProfileTable},
    registry::{AnimationRegistry, OverrideFn, OverrideInput, OverrideOutput},
};
pub use crate::config::ReelConfig;
pub use crate::content::{Content, ContentRecord, Dataset, RumorValue};
pub use crate::eval::{Evaluator, FrameState};
pub use crate::foundation::core::{Role, Target, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult};
pub use crate::orchestrator::{Player, PlayerEvent, PlayerState};
pub use crate::rotation::RotationController;
pub use crate::scene::Scene;
pub use crate::segment::{Fragment, MarkupMode};
