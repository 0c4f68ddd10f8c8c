use std::collections::BTreeMap;

use crate::{
    animation::{plan::Plan, props::Style},
    foundation::{
        core::Target,
        error::{ReelError, ReelResult},
    },
};

/// Resolved styles of every animated target at one instant.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameState {
    pub time: f64,
    #[serde(serialize_with = "targets_by_name")]
    pub targets: BTreeMap<Target, Style>,
}

fn targets_by_name<S: serde::Serializer>(
    targets: &BTreeMap<Target, Style>,
    ser: S,
) -> Result<S::Ok, S::Error> {
    ser.collect_map(targets.iter().map(|(t, s)| (t.to_string(), s)))
}

impl FrameState {
    pub fn style(&self, target: &Target) -> Option<&Style> {
        self.targets.get(target)
    }

    /// Targets with non-zero opacity.
    pub fn visible(&self) -> impl Iterator<Item = &Target> + '_ {
        self.targets
            .iter()
            .filter(|(_, s)| s.is_visible())
            .map(|(t, _)| t)
    }
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(plan))]
    pub fn sample(plan: &Plan, time: f64) -> ReelResult<FrameState> {
        if !time.is_finite() || time < 0.0 {
            return Err(ReelError::animation(format!(
                "sample time must be finite and >= 0 (got {time})"
            )));
        }

        let mut targets: BTreeMap<Target, Style> = BTreeMap::new();
        for (target, prop, _) in plan.tracks() {
            let style = targets.entry(target.clone()).or_default();
            if let Some(v) = plan.value(target, prop, time) {
                style.set(prop, v);
            }
        }

        Ok(FrameState { time, targets })
    }
}
