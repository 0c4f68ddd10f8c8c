use std::collections::BTreeMap;

use crate::{
    animation::{
        ease::Ease,
        props::{Prop, lerp},
        timeline::{Child, Timeline, Tween},
    },
    foundation::core::Target,
};

/// One property of one target animated over an absolute time window.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub iteration: f64, // absolute length of one play-through
    pub repeat: u32,
    pub yoyo: bool,
    pub from: f64,
    pub to: f64,
    pub ease: Ease,
    order: usize, // insertion order, breaks start-time ties
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.iteration * f64::from(self.repeat + 1)
    }

    pub fn value_at(&self, t: f64) -> f64 {
        if self.iteration <= 0.0 {
            return self.to;
        }
        let local = (t - self.start).max(0.0);
        let plays = f64::from(self.repeat + 1);
        if local >= self.iteration * plays {
            let reversed = self.yoyo && self.repeat % 2 == 1;
            return if reversed { self.from } else { self.to };
        }
        let n = (local / self.iteration).floor();
        let mut p = (local - n * self.iteration) / self.iteration;
        if self.yoyo && (n as u64) % 2 == 1 {
            p = 1.0 - p;
        }
        lerp(self.from, self.to, self.ease.apply(p))
    }
}

struct Pending {
    segment: Segment,
    from: Option<f64>,
}

/// A timeline tree flattened to per-(target, property) segment tracks in absolute time.
///
/// `to`-style tweens start from whatever their target showed when they began; those start
/// values are resolved once here so sampling is a pure lookup.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    tracks: BTreeMap<(Target, Prop), Vec<Segment>>,
    duration: f64,
}

impl Plan {
    pub fn compile(root: &Timeline) -> Self {
        let mut pending: BTreeMap<(Target, Prop), Vec<Pending>> = BTreeMap::new();
        let mut order = 0usize;
        let scale = 1.0 / root.time_scale();
        flatten(root, 0.0, scale, &mut pending, &mut order);

        let tracks = pending
            .into_iter()
            .map(|(key, mut segs)| {
                segs.sort_by(|a, b| {
                    a.segment
                        .start
                        .total_cmp(&b.segment.start)
                        .then(a.segment.order.cmp(&b.segment.order))
                });
                let mut resolved: Vec<Segment> = Vec::with_capacity(segs.len());
                for p in segs {
                    let mut seg = p.segment;
                    seg.from = match p.from {
                        Some(v) => v,
                        None => sample_track(&resolved, seg.start).unwrap_or(key.1.initial()),
                    };
                    resolved.push(seg);
                }
                (key, resolved)
            })
            .collect();

        Self {
            tracks,
            duration: root.effective_duration(),
        }
    }

    /// Absolute end of the root timeline.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> + '_ {
        let mut last: Option<&Target> = None;
        self.tracks.keys().filter_map(move |(t, _)| {
            if last == Some(t) {
                return None;
            }
            last = Some(t);
            Some(t)
        })
    }

    /// Animated value at absolute time `t`, or `None` if nothing has touched it yet.
    pub fn value(&self, target: &Target, prop: Prop, t: f64) -> Option<f64> {
        let track = self.tracks.get(&(target.clone(), prop))?;
        sample_track(track, t)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&Target, Prop, &[Segment])> + '_ {
        self.tracks
            .iter()
            .map(|((t, p), segs)| (t, *p, segs.as_slice()))
    }
}

fn sample_track(track: &[Segment], t: f64) -> Option<f64> {
    // Last segment (in start order) that has begun wins.
    let idx = track.partition_point(|s| s.start <= t);
    if idx == 0 {
        return None;
    }
    Some(track[idx - 1].value_at(t))
}

fn flatten(
    tl: &Timeline,
    base: f64,
    scale: f64, // absolute seconds per local second
    out: &mut BTreeMap<(Target, Prop), Vec<Pending>>,
    order: &mut usize,
) {
    for placed in tl.children() {
        let start = base + placed.start * scale;
        match &placed.child {
            Child::Tween(tween) => flatten_tween(tween, start, scale, out, order),
            Child::Timeline(child) => {
                flatten(child, start, scale / child.time_scale(), out, order);
            }
            Child::Spacer(_) => {}
        }
    }
}

fn flatten_tween(
    tween: &Tween,
    start: f64,
    scale: f64,
    out: &mut BTreeMap<(Target, Prop), Vec<Pending>>,
    order: &mut usize,
) {
    for (i, target) in tween.targets.iter().enumerate() {
        let target_start = start + (tween.stagger * i as f64) * scale;
        for (prop, to) in tween.to.iter() {
            *order += 1;
            let from = tween.from.as_ref().and_then(|f| f.get(prop));
            out.entry((target.clone(), prop)).or_default().push(Pending {
                segment: Segment {
                    start: target_start,
                    iteration: tween.duration * scale,
                    repeat: tween.repeat,
                    yoyo: tween.yoyo,
                    from: 0.0,
                    to,
                    ease: tween.ease,
                    order: *order,
                },
                from,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::props::Props;

    fn word(i: usize) -> Target {
        Target::word("w", i)
    }

    #[test]
    fn to_tween_starts_from_previous_value() {
        let mut tl = Timeline::new("t");
        tl.set(vec![word(0)], Props::new().opacity(0.0), 0.0).unwrap();
        tl.tween(Tween::to(vec![word(0)], Props::new().opacity(1.0), 1.0), 1.0)
            .unwrap();
        tl.tween(Tween::to(vec![word(0)], Props::new().opacity(0.2), 1.0), 3.0)
            .unwrap();
        let plan = Plan::compile(&tl);
        let v = |t| plan.value(&word(0), Prop::Opacity, t).unwrap();
        assert_eq!(v(0.5), 0.0);
        assert!((v(1.5) - 0.5).abs() < 1e-12);
        assert_eq!(v(2.5), 1.0);
        assert!((v(3.5) - 0.6).abs() < 1e-12);
        assert!((v(10.0) - 0.2).abs() < 1e-12);
        assert!(plan.value(&word(1), Prop::Opacity, 1.0).is_none());
    }

    #[test]
    fn stagger_offsets_each_target() {
        let mut tl = Timeline::new("t");
        tl.tween(
            Tween::from_to(
                vec![word(0), word(1)],
                Props::new().y(20.0),
                Props::new().y(0.0),
                1.0,
            )
            .stagger(0.5),
            0.0,
        )
        .unwrap();
        let plan = Plan::compile(&tl);
        assert!((plan.value(&word(0), Prop::Y, 0.5).unwrap() - 10.0).abs() < 1e-12);
        assert!(plan.value(&word(1), Prop::Y, 0.25).is_none());
        assert!((plan.value(&word(1), Prop::Y, 1.0).unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn nested_time_scale_compresses_child() {
        let mut child = Timeline::new("child");
        child
            .tween(
                Tween::from_to(vec![word(0)], Props::new().x(0.0), Props::new().x(10.0), 4.0),
                0.0,
            )
            .unwrap();
        child.set_time_scale(2.0).unwrap();
        let mut root = Timeline::new("root");
        root.add(child, 1.0).unwrap();
        let plan = Plan::compile(&root);
        assert_eq!(plan.duration(), 3.0);
        assert!((plan.value(&word(0), Prop::X, 2.0).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(plan.value(&word(0), Prop::X, 3.0).unwrap(), 10.0);
    }

    #[test]
    fn yoyo_repeat_swings_back_and_forth() {
        let mut tl = Timeline::new("t");
        tl.tween(
            Tween::from_to(
                vec![word(0)],
                Props::new().y_percent(-10.0),
                Props::new().y_percent(10.0),
                1.0,
            )
            .repeat(2)
            .yoyo(true),
            0.0,
        )
        .unwrap();
        let plan = Plan::compile(&tl);
        let v = |t| plan.value(&word(0), Prop::YPercent, t).unwrap();
        assert!((v(0.5) - 0.0).abs() < 1e-12);
        assert!((v(1.25) - 5.0).abs() < 1e-12);
        assert_eq!(v(3.5), 10.0);
        assert_eq!(tl.duration(), 3.0);
    }

    #[test]
    fn targets_are_listed_once() {
        let mut tl = Timeline::new("t");
        tl.set(vec![word(0)], Props::new().opacity(0.0).y(20.0), 0.0)
            .unwrap();
        let plan = Plan::compile(&tl);
        assert_eq!(plan.targets().count(), 1);
    }
}
