//! Bid-ask spread acceptance policy.
//!
//! A [`SpreadPolicy`] holds one default [`SpreadRule`] plus ordered exception
//! rules. Evaluation selects the first exception whose predicates all hold,
//! derives an absolute and a relative threshold from it, and accepts the
//! spread when it fits under either.
//!
//! # Example
//!
//! ```
//! use quote_refresh::domain::spread::{
//!     AbsoluteThreshold, SpreadContext, SpreadOverrides, SpreadPolicy, SpreadReason, SpreadRule,
//! };
//!
//! let policy = SpreadPolicy::new(SpreadRule {
//!     absolute: Some(AbsoluteThreshold::Flat(0.10)),
//!     relative_factor: Some(0.05),
//!     ..SpreadRule::named("default")
//! });
//!
//! let decision = policy.evaluate(
//!     0.10,
//!     Some(1.0),
//!     Some(100.0),
//!     &SpreadContext::default(),
//!     &SpreadOverrides::default(),
//! );
//! assert!(decision.accepted);
//! assert_eq!(decision.reason, SpreadReason::Abs);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::leg::Right;

/// Inclusive numeric range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    #[serde(default)]
    pub min: Option<T>,
    #[serde(default)]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    /// True when `value` lies within both bounds.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// One bucket of an underlying-price ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBucket {
    /// Highest underlying price this bucket covers.
    pub max_underlying: f64,
    /// Absolute spread allowed inside the bucket.
    pub threshold: f64,
}

/// Absolute threshold: a flat value or an underlying-price ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbsoluteThreshold {
    Flat(f64),
    Buckets(Vec<PriceBucket>),
}

impl AbsoluteThreshold {
    /// Resolve against the underlying price.
    ///
    /// Buckets are scanned in declared order; the first whose ceiling covers
    /// the underlying wins. Without an underlying price no bucket applies.
    #[must_use]
    pub fn resolve(&self, underlying: Option<f64>) -> Option<f64> {
        match self {
            Self::Flat(value) => Some(*value),
            Self::Buckets(buckets) => {
                let underlying = underlying.filter(|u| u.is_finite())?;
                buckets
                    .iter()
                    .find(|bucket| bucket.max_underlying >= underlying)
                    .map(|bucket| bucket.threshold)
            }
        }
    }
}

/// Predicates that select an exception rule. Unset predicates always hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMatch {
    pub symbols: Option<Vec<String>>,
    pub structures: Option<Vec<String>>,
    pub right: Option<Right>,
    pub leg_count: Option<usize>,
    pub leg_count_range: Option<Bounds<usize>>,
    pub underlying_range: Option<Bounds<f64>>,
    pub mid_range: Option<Bounds<f64>>,
    pub width_range: Option<Bounds<f64>>,
}

impl RuleMatch {
    /// True when every configured predicate holds for this evaluation.
    #[must_use]
    pub fn matches(&self, ctx: &SpreadContext, mid: Option<f64>, underlying: Option<f64>) -> bool {
        fn listed(list: &Option<Vec<String>>, value: Option<&str>) -> bool {
            match list {
                None => true,
                Some(list) => value.is_some_and(|value| {
                    list.iter().any(|item| item.trim().eq_ignore_ascii_case(value.trim()))
                }),
            }
        }
        fn within(bounds: &Option<Bounds<f64>>, value: Option<f64>) -> bool {
            match bounds {
                None => true,
                Some(bounds) => value.is_some_and(|v| v.is_finite() && bounds.contains(v)),
            }
        }

        listed(&self.symbols, ctx.symbol.as_deref())
            && listed(&self.structures, ctx.structure.as_deref())
            && self.right.map_or(true, |right| ctx.right == Some(right))
            && self.leg_count.map_or(true, |count| ctx.leg_count == Some(count))
            && self.leg_count_range.map_or(true, |range| {
                ctx.leg_count.is_some_and(|count| range.contains(count))
            })
            && within(&self.underlying_range, underlying)
            && within(&self.mid_range, mid)
            && within(&self.width_range, ctx.width)
    }
}

/// A named threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadRule {
    pub name: String,
    #[serde(default, rename = "match")]
    pub matcher: RuleMatch,
    #[serde(default)]
    pub absolute: Option<AbsoluteThreshold>,
    #[serde(default)]
    pub relative_factor: Option<f64>,
}

impl SpreadRule {
    /// Rule with no predicates and no thresholds.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matcher: RuleMatch::default(),
            absolute: None,
            relative_factor: None,
        }
    }
}

/// What is being evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadContext {
    pub symbol: Option<String>,
    pub structure: Option<String>,
    pub right: Option<Right>,
    pub leg_count: Option<usize>,
    /// Strike width of the structure.
    pub width: Option<f64>,
}

/// Per-call replacements for the selected rule's thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpreadOverrides {
    pub absolute: Option<f64>,
    pub relative_factor: Option<f64>,
}

/// Why a spread was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadReason {
    Abs,
    Rel,
    TooWide,
    InvalidMid,
    Unbounded,
}

impl SpreadReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Rel => "rel",
            Self::TooWide => "too_wide",
            Self::InvalidMid => "invalid_mid",
            Self::Unbounded => "unbounded",
        }
    }
}

impl fmt::Display for SpreadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`SpreadPolicy::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadDecision {
    pub accepted: bool,
    pub reason: SpreadReason,
    /// Larger of the two thresholds, i.e. the effective limit.
    pub threshold: Option<f64>,
    pub absolute: Option<f64>,
    pub relative: Option<f64>,
    /// Name of the rule that supplied the thresholds.
    pub rule: String,
}

/// Default rule plus ordered exceptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPolicy {
    #[serde(default = "default_rule")]
    pub default: SpreadRule,
    #[serde(default)]
    pub exceptions: Vec<SpreadRule>,
}

fn default_rule() -> SpreadRule {
    SpreadRule::named("default")
}

impl Default for SpreadPolicy {
    fn default() -> Self {
        Self::new(default_rule())
    }
}

impl SpreadPolicy {
    /// Policy with only a default rule.
    pub fn new(default: SpreadRule) -> Self {
        Self {
            default,
            exceptions: Vec::new(),
        }
    }

    /// Append an exception rule; earlier exceptions take precedence.
    #[must_use]
    pub fn with_exception(mut self, rule: SpreadRule) -> Self {
        self.exceptions.push(rule);
        self
    }

    /// Rule that applies to this evaluation.
    #[must_use]
    pub fn select(&self, ctx: &SpreadContext, mid: Option<f64>, underlying: Option<f64>) -> &SpreadRule {
        self.exceptions
            .iter()
            .find(|rule| rule.matcher.matches(ctx, mid, underlying))
            .unwrap_or(&self.default)
    }

    /// Accept or reject `spread`.
    ///
    /// Boundaries are closed: a spread equal to a threshold is accepted.
    #[must_use]
    pub fn evaluate(
        &self,
        spread: f64,
        mid: Option<f64>,
        underlying: Option<f64>,
        ctx: &SpreadContext,
        overrides: &SpreadOverrides,
    ) -> SpreadDecision {
        let rule = self.select(ctx, mid, underlying);
        let valid_mid = mid.filter(|m| m.is_finite() && *m > 0.0);

        let absolute = overrides
            .absolute
            .or_else(|| rule.absolute.as_ref().and_then(|a| a.resolve(underlying)));
        let factor = overrides.relative_factor.or(rule.relative_factor);
        let relative = factor.zip(valid_mid).map(|(factor, mid)| factor * mid);
        let threshold = match (absolute, relative) {
            (Some(a), Some(r)) => Some(a.max(r)),
            (a, r) => a.or(r),
        };

        let decide = |accepted: bool, reason: SpreadReason| SpreadDecision {
            accepted,
            reason,
            threshold,
            absolute,
            relative,
            rule: rule.name.clone(),
        };

        if valid_mid.is_none() {
            return decide(false, SpreadReason::InvalidMid);
        }
        let configured = overrides.absolute.is_some() || rule.absolute.is_some();
        if !configured && factor.is_none() {
            return decide(true, SpreadReason::Unbounded);
        }
        if !spread.is_finite() {
            return decide(false, SpreadReason::TooWide);
        }
        if absolute.is_some_and(|limit| spread <= limit) {
            return decide(true, SpreadReason::Abs);
        }
        if relative.is_some_and(|limit| spread <= limit) {
            return decide(true, SpreadReason::Rel);
        }
        decide(false, SpreadReason::TooWide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SpreadPolicy {
        SpreadPolicy::new(SpreadRule {
            absolute: Some(AbsoluteThreshold::Flat(0.10)),
            relative_factor: Some(0.05),
            ..SpreadRule::named("default")
        })
    }

    fn evaluate(policy: &SpreadPolicy, spread: f64, mid: f64) -> SpreadDecision {
        policy.evaluate(
            spread,
            Some(mid),
            Some(100.0),
            &SpreadContext::default(),
            &SpreadOverrides::default(),
        )
    }

    #[test]
    fn absolute_boundary_is_closed() {
        let policy = policy();
        let at = evaluate(&policy, 0.10, 1.0);
        assert!(at.accepted);
        assert_eq!(at.reason, SpreadReason::Abs);

        let above = evaluate(&policy, 0.11, 1.0);
        assert!(!above.accepted);
        assert_eq!(above.reason, SpreadReason::TooWide);
    }

    #[test]
    fn relative_threshold_scales_with_mid() {
        let policy = policy();
        // rel = 0.05 * 4.0 = 0.20 > abs 0.10
        let decision = evaluate(&policy, 0.20, 4.0);
        assert!(decision.accepted);
        assert_eq!(decision.reason, SpreadReason::Rel);
        assert_eq!(decision.threshold, Some(0.20));

        let decision = evaluate(&policy, 0.21, 4.0);
        assert_eq!(decision.reason, SpreadReason::TooWide);
    }

    #[test]
    fn invalid_mid_rejects() {
        let policy = policy();
        for mid in [None, Some(0.0), Some(-1.0), Some(f64::NAN)] {
            let decision = policy.evaluate(
                0.01,
                mid,
                Some(100.0),
                &SpreadContext::default(),
                &SpreadOverrides::default(),
            );
            assert!(!decision.accepted);
            assert_eq!(decision.reason, SpreadReason::InvalidMid);
        }
    }

    #[test]
    fn no_thresholds_is_unbounded() {
        let policy = SpreadPolicy::default();
        let decision = evaluate(&policy, 50.0, 1.0);
        assert!(decision.accepted);
        assert_eq!(decision.reason, SpreadReason::Unbounded);
    }

    #[test]
    fn buckets_pick_first_covering_ceiling_in_declared_order() {
        let policy = SpreadPolicy::new(SpreadRule {
            absolute: Some(AbsoluteThreshold::Buckets(vec![
                PriceBucket {
                    max_underlying: 50.0,
                    threshold: 0.05,
                },
                PriceBucket {
                    max_underlying: 200.0,
                    threshold: 0.15,
                },
                PriceBucket {
                    max_underlying: f64::MAX,
                    threshold: 0.30,
                },
            ])),
            ..SpreadRule::named("ladder")
        });

        let decision = policy.evaluate(
            0.15,
            Some(2.0),
            Some(120.0),
            &SpreadContext::default(),
            &SpreadOverrides::default(),
        );
        assert_eq!(decision.absolute, Some(0.15));
        assert!(decision.accepted);

        let decision = policy.evaluate(
            0.15,
            Some(2.0),
            Some(40.0),
            &SpreadContext::default(),
            &SpreadOverrides::default(),
        );
        assert_eq!(decision.absolute, Some(0.05));
        assert!(!decision.accepted);
    }

    #[test]
    fn unresolved_ladder_is_too_wide() {
        let policy = SpreadPolicy::new(SpreadRule {
            absolute: Some(AbsoluteThreshold::Buckets(vec![PriceBucket {
                max_underlying: 50.0,
                threshold: 0.05,
            }])),
            ..SpreadRule::named("ladder")
        });

        for underlying in [Some(500.0), None] {
            let decision = policy.evaluate(
                99.0,
                Some(1.0),
                underlying,
                &SpreadContext::default(),
                &SpreadOverrides::default(),
            );
            assert!(!decision.accepted, "{underlying:?}");
            assert_eq!(decision.reason, SpreadReason::TooWide);
            assert_eq!(decision.absolute, None);
            assert_eq!(decision.rule, "ladder");
        }
    }

    #[test]
    fn exception_requires_every_predicate() {
        let policy = policy().with_exception(SpreadRule {
            matcher: RuleMatch {
                symbols: Some(vec!["SPX".into()]),
                structures: Some(vec!["iron_condor".into()]),
                leg_count_range: Some(Bounds {
                    min: Some(4),
                    max: Some(4),
                }),
                ..Default::default()
            },
            absolute: Some(AbsoluteThreshold::Flat(1.0)),
            ..SpreadRule::named("spx_condor")
        });

        let mut ctx = SpreadContext {
            symbol: Some("spx".into()),
            structure: Some("iron_condor".into()),
            leg_count: Some(4),
            ..Default::default()
        };
        let decision = policy.evaluate(0.8, Some(1.0), Some(5000.0), &ctx, &SpreadOverrides::default());
        assert_eq!(decision.rule, "spx_condor");
        assert!(decision.accepted);

        ctx.leg_count = Some(2);
        let decision = policy.evaluate(0.8, Some(1.0), Some(5000.0), &ctx, &SpreadOverrides::default());
        assert_eq!(decision.rule, "default");
        assert!(!decision.accepted);
    }

    #[test]
    fn overrides_replace_thresholds_but_not_rule() {
        let policy = policy();
        let overrides = SpreadOverrides {
            absolute: Some(0.5),
            relative_factor: None,
        };
        let decision = policy.evaluate(
            0.4,
            Some(1.0),
            None,
            &SpreadContext::default(),
            &overrides,
        );
        assert!(decision.accepted);
        assert_eq!(decision.absolute, Some(0.5));
        assert_eq!(decision.rule, "default");
    }

    #[test]
    fn policy_deserializes_from_toml() {
        let policy: SpreadPolicy = toml::from_str(
            r#"
[default]
name = "default"
absolute = 0.10
relative_factor = 0.05

[[exceptions]]
name = "cheap_underlyings"
absolute = [
    { max_underlying = 25.0, threshold = 0.03 },
    { max_underlying = 100.0, threshold = 0.08 },
]

[exceptions.match]
underlying_range = { max = 100.0 }
"#,
        )
        .unwrap();

        assert_eq!(policy.exceptions.len(), 1);
        assert_eq!(policy.default.absolute, Some(AbsoluteThreshold::Flat(0.10)));
        assert!(matches!(
            policy.exceptions[0].absolute,
            Some(AbsoluteThreshold::Buckets(ref b)) if b.len() == 2
        ));
    }
}
