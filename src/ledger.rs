//! Category ledger: totals accumulation, add validation, date resolution and
//! record aggregation.
//!
//! All functions here are pure transformations; store reads and writes happen
//! in the dispatch controller.

use chrono::{DateTime, Local, NaiveDate};
use tracing::warn;

use crate::command::Command;
use crate::store::Record;

/// The fixed, closed set of ledger categories, in display order.
pub const CATEGORIES: [&str; 11] = [
    "vegetables",
    "fruits",
    "milk",
    "flour",
    "meat",
    "beans",
    "oil",
    "sugar",
    "alcohol",
    "exercise",
    "coffee",
];

/// Per-category accumulator. Every category is always present and starts at
/// zero; tokens outside [`CATEGORIES`] are rejected, never inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals {
    values: [f64; CATEGORIES.len()],
}

impl CategoryTotals {
    /// All-zero totals.
    pub fn zero() -> Self {
        Self {
            values: [0.0; CATEGORIES.len()],
        }
    }

    /// Add `amount` to `category`. Returns `false` (and leaves the totals
    /// untouched) when the token is not a known category.
    pub fn add(&mut self, category: &str, amount: f64) -> bool {
        match CATEGORIES.iter().position(|c| *c == category) {
            Some(i) => {
                self.values[i] += amount;
                true
            }
            None => false,
        }
    }

    /// Current total for a category, if it is a known one.
    pub fn get(&self, category: &str) -> Option<f64> {
        CATEGORIES
            .iter()
            .position(|c| *c == category)
            .map(|i| self.values[i])
    }

    /// Iterate `(category, total)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        CATEGORIES.iter().zip(self.values.iter()).map(|(c, v)| (*c, *v))
    }
}

impl Default for CategoryTotals {
    fn default() -> Self {
        Self::zero()
    }
}

/// Outcome of applying an `add` command.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Every category token was valid; the entry is ready to store.
    Applied {
        meal_name: String,
        date: NaiveDate,
        totals: CategoryTotals,
    },
    /// At least one token was not a known category. The whole add is
    /// rejected — no partial totals are kept.
    Rejected { token: String },
}

/// Validate and accumulate an `add` command into full category totals.
///
/// The first unknown category token aborts the whole operation and is
/// reported back, so a typo never half-commits an entry.
pub fn apply(command: &Command, now: DateTime<Local>) -> AddOutcome {
    let mut totals = CategoryTotals::zero();
    for (token, amount) in &command.entries {
        if !totals.add(token, *amount) {
            return AddOutcome::Rejected {
                token: token.clone(),
            };
        }
        if amount.is_nan() {
            warn!(category = %token, "non-numeric amount recorded as NaN");
        }
    }
    AddOutcome::Applied {
        meal_name: command.meal_name.clone(),
        date: resolve_entry_date(now),
        totals,
    }
}

/// Resolve the calendar day an entry belongs to.
///
/// Entries logged late at night are meant to count toward the meal-day
/// rather than the calendar day: the rule substitutes yesterday when the
/// clock is past 20:00 and before 04:00. Both bounds are taken on the same
/// nominal day, so the window can never match and the nominal date is always
/// kept. The comparison is preserved as-is; see DESIGN.md.
pub fn resolve_entry_date(now: DateTime<Local>) -> NaiveDate {
    let nominal = now.date_naive();
    let local = now.naive_local();
    let at_4am = nominal.and_hms_opt(4, 0, 0);
    let at_8pm = nominal.and_hms_opt(20, 0, 0);
    match (at_4am, at_8pm) {
        (Some(at_4am), Some(at_8pm)) if local > at_8pm && local < at_4am => {
            nominal.pred_opt().unwrap_or(nominal)
        }
        _ => nominal,
    }
}

/// Capitalise a category token the way the store spells its field names
/// (`"sugar"` → `"Sugar"`).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Sum the per-category fields of a record sequence into one totals map.
///
/// Used identically for the today and yesterday views; only the fetched
/// record set differs. Records missing a category field contribute zero.
pub fn aggregate(records: &[Record]) -> CategoryTotals {
    let mut totals = CategoryTotals::zero();
    for record in records {
        for category in CATEGORIES {
            if let Some(value) = record.number(&capitalize(category)) {
                totals.add(category, value);
            }
        }
    }
    totals
}
