//! Corporate and policy events consumed by the liquidation check and the
//! event-driven arbitrage detector.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ShareConversion,
    Dividend,
    ConstituentRebalance,
    FundamentalBlowup,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ShareConversion => "share_conversion",
            EventKind::Dividend => "dividend",
            EventKind::ConstituentRebalance => "constituent_rebalance",
            EventKind::FundamentalBlowup => "fundamental_blowup",
        }
    }

    pub fn from_name(name: &str) -> Option<EventKind> {
        match name {
            "share_conversion" => Some(EventKind::ShareConversion),
            "dividend" => Some(EventKind::Dividend),
            "constituent_rebalance" => Some(EventKind::ConstituentRebalance),
            "fundamental_blowup" => Some(EventKind::FundamentalBlowup),
            _ => None,
        }
    }

    /// Ranking among tradable event types: share-conversion beats
    /// dividend beats constituent-rebalance. Blow-ups are not tradable.
    pub fn arbitrage_rank(&self) -> Option<u8> {
        match self {
            EventKind::ShareConversion => Some(3),
            EventKind::Dividend => Some(2),
            EventKind::ConstituentRebalance => Some(1),
            EventKind::FundamentalBlowup => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorporateEvent {
    pub date: NaiveDate,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyImpact {
    Favorable,
    Neutral,
    SevereAdverse,
}

impl PolicyImpact {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyImpact::Favorable => "favorable",
            PolicyImpact::Neutral => "neutral",
            PolicyImpact::SevereAdverse => "severe_adverse",
        }
    }

    pub fn from_name(name: &str) -> Option<PolicyImpact> {
        match name {
            "favorable" => Some(PolicyImpact::Favorable),
            "neutral" => Some(PolicyImpact::Neutral),
            "severe_adverse" => Some(PolicyImpact::SevereAdverse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyEvent {
    pub date: NaiveDate,
    pub impact: PolicyImpact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arbitrage_rank_ordering() {
        assert!(
            EventKind::ShareConversion.arbitrage_rank() > EventKind::Dividend.arbitrage_rank()
        );
        assert!(
            EventKind::Dividend.arbitrage_rank() > EventKind::ConstituentRebalance.arbitrage_rank()
        );
        assert_eq!(EventKind::FundamentalBlowup.arbitrage_rank(), None);
    }

    #[test]
    fn event_kind_round_trip() {
        for kind in [
            EventKind::ShareConversion,
            EventKind::Dividend,
            EventKind::ConstituentRebalance,
            EventKind::FundamentalBlowup,
        ] {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn policy_impact_round_trip() {
        for impact in [
            PolicyImpact::Favorable,
            PolicyImpact::Neutral,
            PolicyImpact::SevereAdverse,
        ] {
            assert_eq!(PolicyImpact::from_name(impact.name()), Some(impact));
        }
    }
}
