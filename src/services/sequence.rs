//! Firm-scoped display numbers.
//!
//! Numbers are derived from the current order list rather than a stored
//! counter: the next number for a prefix is one more than the count of orders
//! in that prefix group that already carry a number of the same kind, moved
//! past the highest number of that kind already issued under the prefix.
//! Callers hold the store's write lock while generating, so sequential
//! assignment is gap-free and never reissues a number.

use std::collections::HashMap;

use crate::config::default_firm_prefix_aliases;
use crate::models::Order;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceKind {
    /// `AAA-001`, assigned at creation.
    Serial,
    /// `DS-AAA-001`, assigned at dispatch planning.
    Dispatch,
    /// `LGST-AAA-001`, assigned at logistics.
    Logistics,
}

impl SequenceKind {
    fn stem(self, prefix: &str) -> String {
        match self {
            SequenceKind::Serial => format!("{}-", prefix),
            SequenceKind::Dispatch => format!("DS-{}-", prefix),
            SequenceKind::Logistics => format!("LGST-{}-", prefix),
        }
    }

    fn assigned<'a>(self, order: &'a Order) -> Option<&'a str> {
        match self {
            SequenceKind::Serial => Some(order.serial_no.as_str()),
            SequenceKind::Dispatch => order.ds_number(),
            SequenceKind::Logistics => order.lgst_number(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SequenceGenerator {
    aliases: HashMap<String, String>,
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new(default_firm_prefix_aliases())
    }
}

impl SequenceGenerator {
    /// `aliases` maps firm names to the prefix used in their numbers.
    pub fn new(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(firm, prefix)| (firm.trim().to_uppercase(), prefix.trim().to_uppercase()))
            .collect();
        Self { aliases }
    }

    pub fn prefix_for(&self, firm: &str) -> String {
        let firm = firm.trim().to_uppercase();
        self.aliases.get(&firm).cloned().unwrap_or(firm)
    }

    /// Computes the next number of `kind` for `firm` against `orders`.
    pub fn next(&self, kind: SequenceKind, firm: &str, orders: &[Order]) -> String {
        let prefix = self.prefix_for(firm);
        let stem = kind.stem(&prefix);
        let issued = orders
            .iter()
            .filter(|o| kind.assigned(o).is_some() && self.prefix_for(&o.firm_name) == prefix)
            .count();
        let highest = orders
            .iter()
            .filter_map(|o| {
                let number = kind.assigned(o)?.strip_prefix(stem.as_str())?;
                number.parse::<usize>().ok()
            })
            .max()
            .unwrap_or(0);

        format!("{}{:03}", stem, issued.max(highest) + 1)
    }
}
