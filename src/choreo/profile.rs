//! Default Animation Profiles: the declarative fade-in / hold / fade-out used whenever no
//! registry override matches a component.

use crate::{
    animation::ease::Ease,
    foundation::{
        core::Role,
        error::{ReelError, ReelResult},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FadeIn {
    pub duration: f64,
    pub stagger: f64,
    pub delay: f64,
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FadeOut {
    pub duration: f64,
    pub stagger: f64,
    pub y: f64, // vertical offset words drift to while fading
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeProfile {
    pub fade_in: FadeIn,
    pub fade_out: FadeOut,
}

impl FadeProfile {
    const fn new(fade_in: (f64, f64, f64), fade_out: (f64, f64)) -> Self {
        Self {
            fade_in: FadeIn {
                duration: fade_in.0,
                stagger: fade_in.1,
                delay: fade_in.2,
                ease: Ease::Power2Out,
            },
            fade_out: FadeOut {
                duration: fade_out.0,
                stagger: fade_out.1,
                y: -20.0,
                ease: Ease::Power2In,
            },
        }
    }

    /// `delay + duration + (n - 1) * stagger`; zero when there are no words.
    pub fn fade_in_span(&self, words: usize) -> f64 {
        if words == 0 {
            return 0.0;
        }
        self.fade_in.delay + self.fade_in.duration + (words - 1) as f64 * self.fade_in.stagger
    }

    /// `duration + (n - 1) * stagger`; zero when there are no words.
    pub fn fade_out_span(&self, words: usize) -> f64 {
        if words == 0 {
            return 0.0;
        }
        self.fade_out.duration + (words - 1) as f64 * self.fade_out.stagger
    }

    /// Natural length of the default sub-timeline: fade-out starts where fade-in ends.
    pub fn natural_duration(&self, words: usize) -> f64 {
        self.fade_in_span(words) + self.fade_out_span(words)
    }

    fn validate(&self, role: Role) -> ReelResult<()> {
        let fields = [
            ("fadeIn.duration", self.fade_in.duration),
            ("fadeIn.stagger", self.fade_in.stagger),
            ("fadeIn.delay", self.fade_in.delay),
            ("fadeOut.duration", self.fade_out.duration),
            ("fadeOut.stagger", self.fade_out.stagger),
        ];
        for (name, v) in fields {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(ReelError::config(format!(
                    "{role} profile {name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        Ok(())
    }
}

/// Per-role default profiles. Images have no word profile.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProfileTable {
    pub surtitle: FadeProfile,
    pub title: FadeProfile,
    pub subtitle: FadeProfile,
    pub content: FadeProfile,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            surtitle: FadeProfile::new((0.3, 0.02, 0.05), (0.4, 0.03)),
            title: FadeProfile::new((0.35, 0.025, 0.1), (0.5, 0.04)),
            subtitle: FadeProfile::new((0.3, 0.02, 0.2), (0.4, 0.03)),
            content: FadeProfile::new((0.4, 0.015, 0.25), (0.6, 0.02)),
        }
    }
}

impl ProfileTable {
    pub fn get(&self, role: Role) -> Option<&FadeProfile> {
        match role {
            Role::Surtitle => Some(&self.surtitle),
            Role::Title => Some(&self.title),
            Role::Subtitle => Some(&self.subtitle),
            Role::Content => Some(&self.content),
            Role::Image => None,
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        for role in Role::TEXT {
            if let Some(p) = self.get(role) {
                p.validate(role)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_follow_stagger_math() {
        let t = ProfileTable::default();
        // 0.25 + 0.4 + 3 * 0.015
        assert!((t.content.fade_in_span(4) - 0.695).abs() < 1e-12);
        // 0.6 + 3 * 0.02
        assert!((t.content.fade_out_span(4) - 0.66).abs() < 1e-12);
        assert!((t.content.natural_duration(4) - 1.355).abs() < 1e-12);
    }

    #[test]
    fn zero_words_contribute_nothing() {
        let t = ProfileTable::default();
        assert_eq!(t.surtitle.fade_in_span(0), 0.0);
        assert_eq!(t.surtitle.natural_duration(0), 0.0);
        assert!(t.get(Role::Image).is_none());
    }

    #[test]
    fn negative_values_fail_validation() {
        let mut t = ProfileTable::default();
        t.title.fade_in.stagger = -0.1;
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("title profile fadeIn.stagger"));
    }
}
