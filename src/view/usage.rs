//! Usage indicator: fill width and color tier from consumed/total quota

use serde::Serialize;

use super::ViewTree;

/// Tier boundaries in percent
const WARNING_THRESHOLD: f64 = 30.0;
const CRITICAL_THRESHOLD: f64 = 70.0;

/// Severity band of a usage percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Safe,
    Warning,
    Critical,
}

impl Tier {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= CRITICAL_THRESHOLD {
            Tier::Critical
        } else if percentage >= WARNING_THRESHOLD {
            Tier::Warning
        } else {
            Tier::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Safe => "safe",
            Tier::Warning => "warning",
            Tier::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual state of the usage bar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageBar {
    /// Fill width in percent, always within [0, 100]
    pub width_percent: f64,
    pub tier: Tier,
}

impl UsageBar {
    pub fn set(&mut self, current: f64, total: f64) {
        let percentage = usage_percentage(current, total);
        self.width_percent = percentage;
        self.tier = Tier::from_percentage(percentage);
    }

    /// Fill ratio in [0, 1] for gauge widgets
    pub fn ratio(&self) -> f64 {
        self.width_percent / 100.0
    }
}

/// `current / total` as a percentage clamped to [0, 100].
///
/// A zero, negative or infinite total reads as 0%, as does a NaN input.
/// An infinite `current` clamps like any other overflow.
pub fn usage_percentage(current: f64, total: f64) -> f64 {
    if current.is_nan() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    (current * 100.0 / total).clamp(0.0, 100.0)
}

/// Recompute the usage bar with the given id. Missing bars are ignored.
pub fn update_usage_indicator<T: ViewTree + ?Sized>(tree: &mut T, id: &str, current: f64, total: f64) {
    update(tree.usage_bar_mut(id), current, total);
}

/// Handle-level update for callers that already hold the element
pub fn update(bar: Option<&mut UsageBar>, current: f64, total: f64) {
    if let Some(bar) = bar {
        bar.set(current, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Page, USAGE_BAR};

    fn bar_after(current: f64, total: f64) -> UsageBar {
        let mut bar = UsageBar::default();
        bar.set(current, total);
        bar
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(bar_after(0.0, 100.0), UsageBar { width_percent: 0.0, tier: Tier::Safe });
        assert_eq!(bar_after(29.0, 100.0), UsageBar { width_percent: 29.0, tier: Tier::Safe });
        assert_eq!(bar_after(30.0, 100.0).tier, Tier::Warning);
        assert_eq!(bar_after(69.0, 100.0).tier, Tier::Warning);
        assert_eq!(bar_after(70.0, 100.0).tier, Tier::Critical);
    }

    #[test]
    fn test_overflow_clamps_to_full() {
        let bar = bar_after(150.0, 100.0);
        assert_eq!(bar.width_percent, 100.0);
        assert_eq!(bar.tier, Tier::Critical);
        assert_eq!(bar.ratio(), 1.0);
    }

    #[test]
    fn test_zero_or_negative_total_reads_empty() {
        assert_eq!(usage_percentage(5.0, 0.0), 0.0);
        assert_eq!(usage_percentage(0.0, 0.0), 0.0);
        assert_eq!(usage_percentage(5.0, -10.0), 0.0);
        assert_eq!(bar_after(5.0, 0.0).tier, Tier::Safe);
    }

    #[test]
    fn test_invalid_inputs_stay_in_range() {
        assert_eq!(usage_percentage(-20.0, 100.0), 0.0);
        assert_eq!(usage_percentage(f64::NAN, 100.0), 0.0);
        assert_eq!(usage_percentage(10.0, f64::NAN), 0.0);
        assert_eq!(usage_percentage(10.0, f64::INFINITY), 0.0);
        assert_eq!(usage_percentage(f64::NEG_INFINITY, 100.0), 0.0);
    }

    #[test]
    fn test_infinite_current_clamps_to_full() {
        assert_eq!(usage_percentage(f64::INFINITY, 100.0), 100.0);
        assert_eq!(bar_after(f64::INFINITY, 100.0).tier, Tier::Critical);
    }

    #[test]
    fn test_percentage_matches_formula() {
        for total in [1.0, 3.0, 40.0, 250.0] {
            for step in 0..=60 {
                let current = step as f64 * total / 40.0;
                let p = usage_percentage(current, total);
                assert!((p - (current / total * 100.0).min(100.0)).abs() < 1e-9);
                assert!((0.0..=100.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_update_through_tree() {
        let mut page = Page::account_page();
        update_usage_indicator(&mut page, USAGE_BAR, 12.0, 16.0);

        let bar = page.usage_bar().unwrap();
        assert_eq!(bar.width_percent, 75.0);
        assert_eq!(bar.tier, Tier::Critical);
    }

    #[test]
    fn test_missing_bar_is_noop() {
        let mut page = Page::new();
        update_usage_indicator(&mut page, USAGE_BAR, 1.0, 2.0);
        assert!(page.usage_bar().is_none());

        update(None, 1.0, 2.0);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Safe < Tier::Warning);
        assert!(Tier::Warning < Tier::Critical);
        assert_eq!(Tier::Critical.to_string(), "critical");
    }
}
