use std::collections::HashMap;

use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;

use yieldkeeper_types::YieldOpportunity;

/// Summary statistics over a `scan_all` result set (§4.4).
#[derive(Debug, Clone)]
pub struct YieldComparison {
    pub count: usize,
    pub best: Option<YieldOpportunity>,
    pub worst: Option<YieldOpportunity>,
    pub mean_apy: Decimal,
    pub median_apy: Decimal,
    pub spread_apy: Decimal,
    pub stddev_apy: Decimal,
    pub per_protocol: HashMap<String, ProtocolSubtotal>,
}

#[derive(Debug, Clone)]
pub struct ProtocolSubtotal {
    pub count: usize,
    pub best_apy: Decimal,
    pub total_tvl_usd: Decimal,
}

impl YieldComparison {
    pub fn from_opportunities(opportunities: &[YieldOpportunity]) -> Self {
        if opportunities.is_empty() {
            return Self {
                count: 0,
                best: None,
                worst: None,
                mean_apy: Decimal::ZERO,
                median_apy: Decimal::ZERO,
                spread_apy: Decimal::ZERO,
                stddev_apy: Decimal::ZERO,
                per_protocol: HashMap::new(),
            };
        }

        let mut apys: Vec<Decimal> = opportunities.iter().map(|o| o.apy).collect();
        apys.sort();

        let count = opportunities.len();
        let sum: Decimal = apys.iter().sum();
        let mean_apy = sum / Decimal::from(count);

        let median_apy = if count % 2 == 1 {
            apys[count / 2]
        } else {
            (apys[count / 2 - 1] + apys[count / 2]) / Decimal::from(2)
        };

        let best_apy = *apys.last().unwrap();
        let worst_apy = apys[0];
        let spread_apy = best_apy - worst_apy;

        let variance: Decimal = apys
            .iter()
            .map(|apy| {
                let diff = *apy - mean_apy;
                diff * diff
            })
            .sum::<Decimal>()
            / Decimal::from(count);
        let stddev_apy = variance.sqrt().unwrap_or(Decimal::ZERO);

        let best = opportunities
            .iter()
            .max_by(|a, b| a.apy.cmp(&b.apy))
            .cloned();
        let worst = opportunities
            .iter()
            .min_by(|a, b| a.apy.cmp(&b.apy))
            .cloned();

        let mut per_protocol: HashMap<String, ProtocolSubtotal> = HashMap::new();
        for opp in opportunities {
            let entry = per_protocol
                .entry(opp.protocol.clone())
                .or_insert(ProtocolSubtotal {
                    count: 0,
                    best_apy: Decimal::ZERO,
                    total_tvl_usd: Decimal::ZERO,
                });
            entry.count += 1;
            entry.best_apy = entry.best_apy.max(opp.apy);
            entry.total_tvl_usd += opp.tvl_usd;
        }

        Self {
            count,
            best,
            worst,
            mean_apy,
            median_apy,
            spread_apy,
            stddev_apy,
            per_protocol,
        }
    }
}
