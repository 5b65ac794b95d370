//! Mid-price resolution.
//!
//! Two flavours live here:
//!
//! - [`live_mid`] prices a leg from a fresh gateway snapshot.
//! - [`resolve_mid`] picks the most trusted of the build-time tiers:
//!   true bid/ask mid, parity from the paired leg's true mid, parity from the
//!   paired leg's close, vendor model price, last close.
//!
//! Only the first two tiers are trusted; anything else leaves the proposal
//! flagged for a refresh.

use chrono::NaiveDate;

use super::contract::expiry_date;
use super::leg::{finite, MidSource, OptionLeg, Right};

const DAYS_PER_YEAR: f64 = 365.0;

/// Mean of bid and ask when both are finite and non-negative.
#[must_use]
pub fn true_mid(bid: Option<f64>, ask: Option<f64>) -> Option<f64> {
    let bid = finite(bid).filter(|b| *b >= 0.0)?;
    let ask = finite(ask).filter(|a| *a >= 0.0)?;
    Some((bid + ask) / 2.0)
}

/// Mid for a freshly refreshed leg: bid/ask mean, else last trade, else unset.
#[must_use]
pub fn live_mid(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> Option<f64> {
    true_mid(bid, ask).or_else(|| finite(last))
}

/// Put-call parity price for `right`, given the paired opposite-right price.
///
/// `C - P = S - K * exp(-r * T)`. Negative or non-finite results are
/// discarded.
#[must_use]
pub fn parity_mid(
    right: Right,
    paired_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    years: f64,
) -> Option<f64> {
    if !(paired_price.is_finite() && spot.is_finite() && strike.is_finite()) {
        return None;
    }
    let discounted_strike = strike * (-rate * years.max(0.0)).exp();
    let price = match right {
        Right::Call => paired_price + spot - discounted_strike,
        Right::Put => paired_price - spot + discounted_strike,
    };
    Some(price).filter(|p| p.is_finite() && *p >= 0.0)
}

/// Candidate prices for one leg, one per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MidInputs {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub parity_true: Option<f64>,
    pub parity_close: Option<f64>,
    pub model: Option<f64>,
    pub close: Option<f64>,
}

/// Outcome of [`resolve_mid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidResolution {
    pub mid: Option<f64>,
    pub source: Option<MidSource>,
}

impl MidResolution {
    const UNRESOLVED: Self = Self {
        mid: None,
        source: None,
    };

    /// Untrusted or missing mids require a live refresh.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        !self.source.is_some_and(MidSource::is_trusted)
    }
}

/// Pick the most trusted available tier.
#[must_use]
pub fn resolve_mid(inputs: &MidInputs) -> MidResolution {
    if let Some(mid) = true_mid(inputs.bid, inputs.ask) {
        return MidResolution {
            mid: Some(mid),
            source: Some(MidSource::True),
        };
    }

    let tiers = [
        (inputs.parity_true, MidSource::ParityTrue),
        (inputs.parity_close, MidSource::ParityClose),
        (inputs.model, MidSource::Model),
        (inputs.close, MidSource::Close),
    ];
    tiers
        .into_iter()
        .find_map(|(price, source)| {
            finite(price)
                .filter(|p| *p >= 0.0)
                .map(|mid| MidResolution {
                    mid: Some(mid),
                    source: Some(source),
                })
        })
        .unwrap_or(MidResolution::UNRESOLVED)
}

/// Resolve a provenance tag from a direct field and a fallback chain.
///
/// Candidates are the direct tag followed by each comma- or `|`-separated
/// entry of the chain. The first non-empty candidate decides; an unknown
/// tag there leaves the source unresolved.
#[must_use]
pub fn resolve_source(direct: Option<&str>, fallback_chain: Option<&str>) -> Option<MidSource> {
    let chain = fallback_chain
        .into_iter()
        .flat_map(|chain| chain.split([',', '|']));
    direct
        .into_iter()
        .chain(chain)
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .and_then(MidSource::parse)
}

/// Market inputs needed to price parity tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParityContext {
    pub spot: Option<f64>,
    pub rate: f64,
    pub today: NaiveDate,
}

/// Resolve build-time mids for every leg of a proposal in place.
///
/// Returns `true` when at least one leg ended up without a trusted mid.
pub fn resolve_leg_mids(legs: &mut [OptionLeg], ctx: &ParityContext) -> bool {
    let inputs: Vec<MidInputs> = (0..legs.len()).map(|i| mid_inputs(legs, i, ctx)).collect();

    let mut needs_refresh = false;
    for (leg, inputs) in legs.iter_mut().zip(inputs) {
        let resolution = resolve_mid(&inputs);
        match resolution.source {
            Some(source) => {
                leg.mid = resolution.mid;
                leg.mid_source = Some(source);
            }
            None => {
                // Keep a caller-provided mid only if its provenance is known.
                let hinted = resolve_source(
                    leg.mid_source.map(MidSource::as_str),
                    leg.mid_fallback.as_deref(),
                );
                if finite(leg.mid).is_none() || hinted.is_none() {
                    leg.mid = None;
                    leg.mid_source = None;
                } else {
                    leg.mid_source = hinted;
                }
            }
        }
        if !leg.mid_source.is_some_and(MidSource::is_trusted) {
            needs_refresh = true;
        }
    }
    needs_refresh
}

fn mid_inputs(legs: &[OptionLeg], index: usize, ctx: &ParityContext) -> MidInputs {
    let leg = &legs[index];
    let mut inputs = MidInputs {
        bid: leg.bid,
        ask: leg.ask,
        model: leg.model,
        close: leg.close,
        ..Default::default()
    };

    let Some(spot) = finite(ctx.spot) else {
        return inputs;
    };
    let Some(paired) = legs.iter().find(|other| {
        other.right == leg.right.opposite()
            && other.symbol == leg.symbol
            && other.expiry == leg.expiry
            && (other.strike - leg.strike).abs() < f64::EPSILON
    }) else {
        return inputs;
    };

    let years = expiry_date(&leg.expiry)
        .map(|expiry| (expiry - ctx.today).num_days().max(0) as f64 / DAYS_PER_YEAR)
        .unwrap_or(0.0);
    let parity = |price: f64| parity_mid(leg.right, price, spot, leg.strike, ctx.rate, years);

    inputs.parity_true = true_mid(paired.bid, paired.ask).and_then(parity);
    inputs.parity_close = finite(paired.close).and_then(parity);
    inputs
}
