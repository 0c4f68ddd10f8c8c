//! Master timeline labels and the normalized timing contract.
//!
//! Labels go through three stages: [`estimate`] places them from default-profile math,
//! components are attached at those positions, then [`correct`] re-measures the content
//! component that was actually attached and moves its labels to match.

use std::collections::BTreeMap;

use crate::{
    animation::timeline::Timeline,
    choreo::{component::ComponentTimeline, profile::ProfileTable},
    foundation::core::Role,
};

/// Fade boundaries of one component, in master seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub fade_in_start: f64,
    pub fade_in_complete: f64,
    pub fade_out_start: f64,
    pub fade_out_end: f64,
}

impl Window {
    /// Start-to-end length the component's sub-timeline must fill.
    pub fn span(&self) -> f64 {
        self.fade_out_end - self.fade_in_start
    }
}

/// Container effect marks at fixed fractions of the estimated total.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMarks {
    pub total: f64,
    pub smoke_clear: f64,       // 1/3
    pub fade_out_start: f64,    // 1/2
    pub fade_out_duration: f64, // 2/3
    pub waver_period: f64,      // 1/4
}

impl ContainerMarks {
    pub fn for_total(total: f64) -> Self {
        Self {
            total,
            smoke_clear: total / 3.0,
            fade_out_start: total / 2.0,
            fade_out_duration: total * 2.0 / 3.0,
            waver_period: total / 4.0,
        }
    }

    pub fn fade_out_end(&self) -> f64 {
        self.fade_out_start + self.fade_out_duration
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterLabelSet {
    /// Only roles with at least one word unit get a window.
    pub windows: BTreeMap<Role, Window>,
    pub fade_in_complete: f64,
    pub hold_complete: f64,
    pub container: ContainerMarks,
}

impl MasterLabelSet {
    pub fn window(&self, role: Role) -> Option<&Window> {
        self.windows.get(&role)
    }

    /// Window images align against: the content window, or the whole hold when the
    /// content has no words.
    pub fn image_window(&self) -> Window {
        self.window(Role::Content).copied().unwrap_or(Window {
            fade_in_start: 0.0,
            fade_in_complete: self.fade_in_complete,
            fade_out_start: self.hold_complete,
            fade_out_end: self.hold_complete,
        })
    }

    pub fn fade_in_start_label(role: Role) -> String {
        format!("{role}FadeInStart")
    }

    /// Every label as `(name, seconds)`.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(self.windows.len() * 4 + 6);
        for (role, w) in &self.windows {
            out.push((Self::fade_in_start_label(*role), w.fade_in_start));
            out.push((format!("{role}FadeInComplete"), w.fade_in_complete));
            out.push((format!("{role}FadeOutStart"), w.fade_out_start));
            out.push((format!("{role}FadeOutEnd"), w.fade_out_end));
        }
        out.push(("fadeInComplete".to_string(), self.fade_in_complete));
        out.push(("holdComplete".to_string(), self.hold_complete));
        out.push(("containerDrift".to_string(), 0.0));
        out.push(("containerWaver".to_string(), 0.0));
        out.push(("smokeClear".to_string(), self.container.smoke_clear));
        out.push(("containerFadeOut".to_string(), self.container.fade_out_start));
        out
    }

    /// Write (or move) every label on `tl`.
    pub fn apply(&self, tl: &mut Timeline) {
        for (name, time) in self.entries() {
            tl.add_label(name, time);
        }
    }
}

/// Word-unit count per text role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordCounts {
    pub surtitle: usize,
    pub title: usize,
    pub subtitle: usize,
    pub content: usize,
}

impl WordCounts {
    pub fn get(&self, role: Role) -> usize {
        match role {
            Role::Surtitle => self.surtitle,
            Role::Title => self.title,
            Role::Subtitle => self.subtitle,
            Role::Content => self.content,
            Role::Image => 0,
        }
    }

    pub fn set(&mut self, role: Role, n: usize) {
        match role {
            Role::Surtitle => self.surtitle = n,
            Role::Title => self.title = n,
            Role::Subtitle => self.subtitle = n,
            Role::Content => self.content = n,
            Role::Image => {}
        }
    }
}

/// Pass 1 output.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub fade_in_complete: f64,
    pub hold: f64,
    pub fade_out_start: f64,
    pub fade_out_duration: f64,
    pub total: f64,
    pub labels: MasterLabelSet,
}

/// Place provisional labels from default-profile math and real word counts.
pub fn estimate(words: &WordCounts, hold_secs: f64, profiles: &ProfileTable) -> Estimate {
    let fade_in_complete = Role::TEXT
        .into_iter()
        .filter_map(|role| Some(profiles.get(role)?.fade_in_span(words.get(role))))
        .fold(0.0, f64::max);
    let fade_out_duration = profiles.content.fade_out_span(words.content);
    let fade_out_start = fade_in_complete + hold_secs;
    let total = fade_out_start + fade_out_duration;

    let mut windows = BTreeMap::new();
    for role in Role::TEXT {
        let n = words.get(role);
        let Some(profile) = profiles.get(role) else {
            continue;
        };
        if n == 0 {
            continue;
        }
        windows.insert(
            role,
            Window {
                fade_in_start: profile.fade_in.delay,
                fade_in_complete: profile.fade_in_span(n),
                fade_out_start,
                fade_out_end: fade_out_start + fade_out_duration,
            },
        );
    }

    Estimate {
        fade_in_complete,
        hold: hold_secs,
        fade_out_start,
        fade_out_duration,
        total,
        labels: MasterLabelSet {
            windows,
            fade_in_complete,
            hold_complete: fade_in_complete + hold_secs,
            container: ContainerMarks::for_total(total),
        },
    }
}

/// Content timing as percentages of its own fade-in-start to fade-out-end span.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingDescriptor {
    pub fade_in_start: f64,
    pub fade_in_duration: f64,
    pub fade_in_complete: f64,
    pub hold_start: f64,
    pub hold_duration: f64,
    pub hold_complete: f64,
    pub fade_out_start: f64,
    pub fade_out_duration: f64,
    pub fade_out_end: f64,
    pub total_duration: f64,
}

impl TimingDescriptor {
    /// Handed to components before the real content timing is known.
    pub fn placeholder() -> Self {
        Self {
            fade_in_start: 0.0,
            fade_in_duration: 10.0,
            fade_in_complete: 10.0,
            hold_start: 10.0,
            hold_duration: 80.0,
            hold_complete: 90.0,
            fade_out_start: 90.0,
            fade_out_duration: 10.0,
            fade_out_end: 100.0,
            total_duration: 100.0,
        }
    }

    /// Derived from label positions only. Fade-out length is taken to equal fade-in length;
    /// that holds for the default profiles but not for overrides with asymmetric fades.
    pub fn from_window(w: &Window) -> Self {
        let total = w.span();
        if !(total > 0.0 && total.is_finite()) {
            return Self::placeholder();
        }
        let pct = |secs: f64| secs / total * 100.0;
        let fade_in = pct(w.fade_in_complete - w.fade_in_start);
        let fade_out_start = pct(w.fade_out_start - w.fade_in_start);
        Self {
            fade_in_start: 0.0,
            fade_in_duration: fade_in,
            fade_in_complete: fade_in,
            hold_start: fade_in,
            hold_duration: pct(w.fade_out_start - w.fade_in_complete),
            hold_complete: fade_out_start,
            fade_out_start,
            fade_out_duration: fade_in,
            fade_out_end: 100.0,
            total_duration: 100.0,
        }
    }
}

/// Pass 2 output: the label set with the content window re-measured.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub labels: MasterLabelSet,
    pub content_time_scale: f64,
    pub fade_in: f64,
    pub hold: f64,
    pub fade_out: f64,
    pub total: f64,
    pub timing: TimingDescriptor,
}

/// Re-derive the content labels from the sub-timeline that was attached.
pub fn correct(estimated: &MasterLabelSet, content: Option<&ComponentTimeline>) -> Correction {
    let mut labels = estimated.clone();
    let measured = content.and_then(|c| Some((c, estimated.window(Role::Content)?)));
    let Some((c, window)) = measured else {
        return Correction {
            labels,
            content_time_scale: 1.0,
            fade_in: 0.0,
            hold: 0.0,
            fade_out: 0.0,
            total: 0.0,
            timing: TimingDescriptor::placeholder(),
        };
    };

    let scale = c.timeline.time_scale();
    let start = window.fade_in_start;
    let fade_in = c.natural_fade_in_span / scale;
    let end = start + c.timeline.effective_duration();
    let corrected = Window {
        fade_in_start: start,
        fade_in_complete: start + fade_in,
        fade_out_start: end - fade_in,
        fade_out_end: end,
    };
    labels.windows.insert(Role::Content, corrected);

    Correction {
        labels,
        content_time_scale: scale,
        fade_in,
        hold: corrected.fade_out_start - corrected.fade_in_complete,
        fade_out: fade_in,
        total: corrected.span(),
        timing: TimingDescriptor::from_window(&corrected),
    }
}
