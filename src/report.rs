//! Flat-rate vs time-of-use cost comparison.

use std::fmt;

use crate::{
    config::{RatePlan, UnclassifiedPolicy},
    interval::{Interval, PeriodLabel},
};

/// Usage and cost for one priced period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelUsage {
    pub label: PeriodLabel,
    pub intervals: usize,
    pub kwh: f64,
    pub rate: f64,
    pub cost: f64,
}

/// Energy no tariff window claimed, including intervals never classified.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnclassifiedUsage {
    pub intervals: usize,
    pub kwh: f64,
    /// Non-zero only under [`UnclassifiedPolicy::Flat`].
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    pub total_kwh: f64,
    pub flat_rate: f64,
    pub flat_cost: f64,
    /// One entry per priced label, in [`PeriodLabel::PRICED`] order.
    pub by_label: Vec<LabelUsage>,
    pub unclassified: UnclassifiedUsage,
    pub policy: UnclassifiedPolicy,
    pub tou_cost: f64,
}

impl UsageReport {
    /// Sums usage and cost over labeled intervals. The order of `intervals`
    /// does not matter.
    #[must_use]
    pub fn from_intervals(
        intervals: &[Interval],
        rates: &RatePlan,
        policy: UnclassifiedPolicy,
    ) -> Self {
        let mut by_label: Vec<LabelUsage> = PeriodLabel::PRICED
            .iter()
            .filter_map(|&label| {
                let rate = rates.rate(label)?;
                Some(LabelUsage { label, intervals: 0, kwh: 0.0, rate, cost: 0.0 })
            })
            .collect();
        let mut unclassified = UnclassifiedUsage::default();
        let mut total_kwh = 0.0;

        for interval in intervals {
            total_kwh += interval.energy_kwh;
            let label = interval.period_label.unwrap_or(PeriodLabel::Unclassified);
            match by_label.iter_mut().find(|usage| usage.label == label) {
                Some(usage) => {
                    usage.intervals += 1;
                    usage.kwh += interval.energy_kwh;
                }
                None => {
                    unclassified.intervals += 1;
                    unclassified.kwh += interval.energy_kwh;
                }
            }
        }

        for usage in &mut by_label {
            usage.cost = usage.kwh * usage.rate;
        }
        if policy == UnclassifiedPolicy::Flat {
            unclassified.cost = unclassified.kwh * rates.flat;
        }
        let tou_cost = by_label.iter().map(|usage| usage.cost).sum::<f64>() + unclassified.cost;

        Self {
            total_kwh,
            flat_rate: rates.flat,
            flat_cost: total_kwh * rates.flat,
            by_label,
            unclassified,
            policy,
            tou_cost,
        }
    }

    /// Negative when the time-of-use plan is more expensive.
    #[must_use]
    pub fn savings(&self) -> f64 {
        self.flat_cost - self.tou_cost
    }

    #[must_use]
    pub fn classified_kwh(&self) -> f64 {
        self.by_label.iter().map(|usage| usage.kwh).sum()
    }

    /// Total usage the priced labels do not account for.
    #[must_use]
    pub fn discrepancy_kwh(&self) -> f64 {
        self.total_kwh - self.classified_kwh()
    }

    #[must_use]
    pub fn usage(&self, label: PeriodLabel) -> Option<&LabelUsage> {
        self.by_label.iter().find(|usage| usage.label == label)
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total usage: {:.2} kWh", self.total_kwh)?;
        writeln!(f, "Pre-TOU cost: ${:.2}", self.flat_cost)?;
        writeln!(f)?;

        for usage in self.by_label.iter().filter(|usage| usage.intervals != 0) {
            writeln!(
                f,
                "{} usage: {:.2} kWh × ${:.4}/kWh = ${:.2}",
                usage.label, usage.kwh, usage.rate, usage.cost,
            )?;
        }
        if self.unclassified.intervals != 0 {
            write!(
                f,
                "Warning: {:.2} kWh in {} unclassified intervals",
                self.unclassified.kwh, self.unclassified.intervals,
            )?;
            match self.policy {
                UnclassifiedPolicy::Exclude => writeln!(f, " (not billed)")?,
                UnclassifiedPolicy::Flat => writeln!(
                    f,
                    " billed at ${:.4}/kWh = ${:.2}",
                    self.flat_rate, self.unclassified.cost,
                )?,
            }
        }
        writeln!(f, "Post-TOU cost: ${:.2}", self.tou_cost)?;
        writeln!(f)?;
        write!(f, "Your savings: ${:.2}", self.savings())
    }
}
