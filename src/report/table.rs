use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::quarter::QuarterId;

/// Row labels of a [`FinancialTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialField {
    Revenue,
    GrossProfit,
    OperatingProfit,
    NetProfit,
    MarketCap,
    PeTtm,
    SharesOutstanding,
}

impl FinancialField {
    /// Canonical row order used for display and persistence
    pub const ALL: [FinancialField; 7] = [
        FinancialField::Revenue,
        FinancialField::GrossProfit,
        FinancialField::OperatingProfit,
        FinancialField::NetProfit,
        FinancialField::MarketCap,
        FinancialField::PeTtm,
        FinancialField::SharesOutstanding,
    ];

    /// Fields accumulated year-to-date in HK reports
    pub const FLOWS: [FinancialField; 4] = [
        FinancialField::Revenue,
        FinancialField::GrossProfit,
        FinancialField::OperatingProfit,
        FinancialField::NetProfit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialField::Revenue => "revenue",
            FinancialField::GrossProfit => "gross_profit",
            FinancialField::OperatingProfit => "operating_profit",
            FinancialField::NetProfit => "net_profit",
            FinancialField::MarketCap => "market_cap",
            FinancialField::PeTtm => "pe_ttm",
            FinancialField::SharesOutstanding => "shares_outstanding",
        }
    }
}

impl FromStr for FinancialField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revenue" => Ok(FinancialField::Revenue),
            "gross_profit" => Ok(FinancialField::GrossProfit),
            "operating_profit" => Ok(FinancialField::OperatingProfit),
            "net_profit" => Ok(FinancialField::NetProfit),
            "market_cap" => Ok(FinancialField::MarketCap),
            "pe_ttm" => Ok(FinancialField::PeTtm),
            "shares_outstanding" => Ok(FinancialField::SharesOutstanding),
            _ => Err(()),
        }
    }
}

/// One quarter column. Absent values stay `None`; they are never coerced to NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_profit: Option<f64>,
    pub net_profit: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub shares_outstanding: Option<f64>,
}

impl FinancialRecord {
    pub fn get(&self, field: FinancialField) -> Option<f64> {
        match field {
            FinancialField::Revenue => self.revenue,
            FinancialField::GrossProfit => self.gross_profit,
            FinancialField::OperatingProfit => self.operating_profit,
            FinancialField::NetProfit => self.net_profit,
            FinancialField::MarketCap => self.market_cap,
            FinancialField::PeTtm => self.pe_ttm,
            FinancialField::SharesOutstanding => self.shares_outstanding,
        }
    }

    pub fn set(&mut self, field: FinancialField, value: Option<f64>) {
        let slot = match field {
            FinancialField::Revenue => &mut self.revenue,
            FinancialField::GrossProfit => &mut self.gross_profit,
            FinancialField::OperatingProfit => &mut self.operating_profit,
            FinancialField::NetProfit => &mut self.net_profit,
            FinancialField::MarketCap => &mut self.market_cap,
            FinancialField::PeTtm => &mut self.pe_ttm,
            FinancialField::SharesOutstanding => &mut self.shares_outstanding,
        };
        *slot = value;
    }

    /// Single-quarter figures from two year-to-date snapshots.
    ///
    /// Flow fields become `self - previous`; point-in-time fields are copied
    /// from `self`. A missing operand leaves the flow field absent.
    pub fn minus_cumulative(&self, previous: &FinancialRecord) -> FinancialRecord {
        let mut out = self.clone();
        for field in FinancialField::FLOWS {
            let delta = match (self.get(field), previous.get(field)) {
                (Some(current), Some(prev)) => Some(current - prev),
                _ => None,
            };
            out.set(field, delta);
        }
        out
    }

    /// Overlay every value present in `other`
    pub fn overlay(&mut self, other: &FinancialRecord) {
        for field in FinancialField::ALL {
            if let Some(value) = other.get(field) {
                self.set(field, Some(value));
            }
        }
    }
}

/// Quarter-indexed financial table.
///
/// Columns keep insertion order; inserting an existing quarter replaces its
/// record in place. Consumers must not assume the columns are sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialTable {
    columns: Vec<(QuarterId, FinancialRecord)>,
}

impl FinancialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quarter: QuarterId, record: FinancialRecord) {
        match self.columns.iter_mut().find(|(q, _)| *q == quarter) {
            Some((_, existing)) => *existing = record,
            None => self.columns.push((quarter, record)),
        }
    }

    /// Record for `quarter`, creating an empty column at the end if absent
    pub fn entry(&mut self, quarter: QuarterId) -> &mut FinancialRecord {
        let idx = match self.columns.iter().position(|(q, _)| *q == quarter) {
            Some(idx) => idx,
            None => {
                self.columns.push((quarter, FinancialRecord::default()));
                self.columns.len() - 1
            }
        };
        &mut self.columns[idx].1
    }

    pub fn get(&self, quarter: &QuarterId) -> Option<&FinancialRecord> {
        self.columns
            .iter()
            .find(|(q, _)| q == quarter)
            .map(|(_, record)| record)
    }

    pub fn contains(&self, quarter: &QuarterId) -> bool {
        self.get(quarter).is_some()
    }

    pub fn quarters(&self) -> impl Iterator<Item = QuarterId> + '_ {
        self.columns.iter().map(|(q, _)| *q)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuarterId, &FinancialRecord)> {
        self.columns.iter().map(|(q, record)| (q, record))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Broadcast join: overlay one snapshot onto every quarter column.
    ///
    /// Used when the provider only has the latest market data (US listings):
    /// the same snapshot values appear in every column.
    pub fn broadcast(&mut self, snapshot: &FinancialRecord) {
        for (_, record) in self.columns.iter_mut() {
            record.overlay(snapshot);
        }
    }
}
