//! Price computation for laundry orders.
//!
//! Pure functions: unit price = offering price + speed surcharge, total =
//! unit price × quantity. Missing selections and out-of-range quantities
//! are rejected up front instead of silently pricing at zero.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::Category;

/// Minimum billable weight in kilograms; weights move in 0.5 kg steps.
pub const MIN_WEIGHT_KG: f64 = 0.5;
/// Weight stepper increment in kilograms.
pub const WEIGHT_STEP_KG: f64 = 0.5;
/// Minimum billable item count.
pub const MIN_QTY: i64 = 1;

/// Order quantity in the unit implied by the category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    /// Kilograms, fractional in 0.5 steps.
    Kilo(f64),
    /// Whole item count.
    Satuan(i64),
}

impl Quantity {
    pub fn category(self) -> Category {
        match self {
            Quantity::Kilo(_) => Category::Kilo,
            Quantity::Satuan(_) => Category::Satuan,
        }
    }
}

/// Result of a price computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub price_per_unit: i64,
    pub total: i64,
}

/// Validate a quantity against the category's minimum and step rules.
pub fn validate_quantity(category: Category, quantity: Quantity) -> Result<(), StoreError> {
    if quantity.category() != category {
        return Err(StoreError::validation(format!(
            "quantity unit does not match category '{}'",
            category.code()
        )));
    }
    match quantity {
        Quantity::Kilo(weight) => {
            if !weight.is_finite() || weight < MIN_WEIGHT_KG {
                return Err(StoreError::validation(format!(
                    "weight must be at least {MIN_WEIGHT_KG} kg"
                )));
            }
            // Weights come from a 0.5 kg stepper; anything else is a caller bug.
            let steps = weight / WEIGHT_STEP_KG;
            if (steps - steps.round()).abs() > 1e-9 {
                return Err(StoreError::validation(format!(
                    "weight must be a multiple of {WEIGHT_STEP_KG} kg"
                )));
            }
        }
        Quantity::Satuan(qty) => {
            if qty < MIN_QTY {
                return Err(StoreError::validation(format!(
                    "item count must be at least {MIN_QTY}"
                )));
            }
        }
    }
    Ok(())
}

/// Compute the unit price and total for an order.
///
/// `unit_price` is the offering's base price, `surcharge` the speed's
/// per-unit extra for the same category. Both are whole rupiah. Kilo
/// totals are rounded to the nearest rupiah; with real tariffs (multiples
/// of 100) and 0.5 kg steps the result is exact.
pub fn compute_price(
    category: Category,
    unit_price: i64,
    surcharge: i64,
    quantity: Quantity,
) -> Result<PriceQuote, StoreError> {
    validate_quantity(category, quantity)?;
    if unit_price < 0 || surcharge < 0 {
        return Err(StoreError::validation("prices must not be negative"));
    }

    let price_per_unit = unit_price + surcharge;
    let total = match quantity {
        Quantity::Kilo(weight) => (price_per_unit as f64 * weight).round() as i64,
        Quantity::Satuan(qty) => price_per_unit * qty,
    };

    Ok(PriceQuote {
        price_per_unit,
        total,
    })
}

/// Stepper semantics for the weight input: move by ±0.5 kg, clamped at
/// the minimum.
pub fn step_weight(current: f64, delta_steps: i64) -> f64 {
    let stepped = current + delta_steps as f64 * WEIGHT_STEP_KG;
    // round to one decimal to keep repeated stepping drift-free
    let rounded = (stepped * 10.0).round() / 10.0;
    rounded.max(MIN_WEIGHT_KG)
}

/// Stepper semantics for the item-count input: move by ±1, clamped at 1.
pub fn step_qty(current: i64, delta: i64) -> i64 {
    (current + delta).max(MIN_QTY)
}
