//! Deterministic result ordering.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::contract::normalize_expiry;
use crate::domain::{RefreshSource, StrategyProposal};

/// One component of a sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum SortField {
    Text(String),
    /// Compared with `f64::total_cmp`, so NaN sorts deterministically.
    Number(f64),
}

impl Eq for SortField {}

impl Ord for SortField {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortField {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic sort key. Ties are broken by input index by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey(pub Vec<SortField>);

impl SortKey {
    #[must_use]
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.0.push(SortField::Text(value.into()));
        self
    }

    #[must_use]
    pub fn number(mut self, value: f64) -> Self {
        self.0.push(SortField::Number(value));
        self
    }
}

/// Caller-supplied key function. The proposal is absent for entries that
/// never became one.
pub type SortKeyFn = Arc<dyn Fn(&RefreshSource, Option<&StrategyProposal>) -> SortKey + Send + Sync>;

/// Symbol, first-leg expiry, first-leg strike, strategy; all ascending.
#[must_use]
pub fn default_sort_key(source: &RefreshSource, proposal: Option<&StrategyProposal>) -> SortKey {
    let symbol = proposal.map_or(source.symbol.as_str(), |p| p.symbol.as_str());
    let first_leg = proposal.and_then(StrategyProposal::first_leg);
    let expiry = first_leg
        .map(|leg| normalize_expiry(&leg.expiry).unwrap_or_else(|_| leg.expiry.clone()))
        .unwrap_or_default();
    let strike = first_leg.map_or(f64::INFINITY, |leg| leg.strike);
    let strategy = proposal.map_or("", |p| p.strategy.as_str());

    SortKey::default()
        .text(symbol)
        .text(expiry)
        .number(strike)
        .text(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionLeg, ProposalMetrics, Right};

    fn source(index: usize, symbol: &str) -> RefreshSource {
        RefreshSource {
            index,
            entry: serde_json::Value::Null,
            symbol: symbol.into(),
        }
    }

    fn proposal(symbol: &str, expiry: &str, strike: f64, strategy: &str) -> StrategyProposal {
        StrategyProposal::new(
            strategy,
            symbol,
            vec![OptionLeg::new(symbol, expiry, strike, Right::Put, -1)],
            ProposalMetrics::default(),
        )
    }

    #[test]
    fn orders_by_symbol_expiry_strike_strategy() {
        let a = proposal("AAA", "2025-12-19", 100.0, "short_put");
        let b = proposal("AAA", "20251219", 95.0, "short_put");
        let c = proposal("AAA", "2025-11-21", 120.0, "short_put");
        let d = proposal("BBB", "2025-01-17", 10.0, "iron_condor");

        let mut keys = vec![
            (default_sort_key(&source(0, "AAA"), Some(&a)), 'a'),
            (default_sort_key(&source(1, "AAA"), Some(&b)), 'b'),
            (default_sort_key(&source(2, "AAA"), Some(&c)), 'c'),
            (default_sort_key(&source(3, "BBB"), Some(&d)), 'd'),
        ];
        keys.sort();
        let order: String = keys.into_iter().map(|(_, tag)| tag).collect();
        assert_eq!(order, "cbad");
    }

    #[test]
    fn numbers_compare_totally() {
        let nan = SortKey::default().number(f64::NAN);
        let one = SortKey::default().number(1.0);
        assert_eq!(nan.cmp(&nan), Ordering::Equal);
        assert_ne!(nan.cmp(&one), Ordering::Equal);
    }
}
