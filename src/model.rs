//! Values flowing through the sales job: input rows and per-category totals.

use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// One sales transaction.
///
/// Fields are private so that the invariants checked by [`SalesRecord::new`]
/// hold for the whole lifetime of the record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SalesRecord {
    transaction_id: i64,
    product_id: i64,
    category: String,
    price: Decimal,
    quantity: i32,
}

impl SalesRecord {
    /// Builds a record, rejecting a blank category, a negative price or a
    /// negative quantity with [`Error::InvalidValue`].
    pub fn new(
        transaction_id: i64,
        product_id: i64,
        category: impl Into<String>,
        price: Decimal,
        quantity: i32,
    ) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(Error::invalid("category must not be blank"));
        }
        if price.is_sign_negative() && !price.is_zero() {
            return Err(Error::invalid(format!("price must be non-negative, got {price}")));
        }
        if quantity < 0 {
            return Err(Error::invalid(format!(
                "quantity must be non-negative, got {quantity}"
            )));
        }
        Ok(Self {
            transaction_id,
            product_id,
            category,
            price,
            quantity,
        })
    }

    #[inline]
    pub fn transaction_id(&self) -> i64 {
        self.transaction_id
    }

    #[inline]
    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    #[inline]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[inline]
    pub fn price(&self) -> Decimal {
        self.price
    }

    #[inline]
    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    /// `price * quantity`, computed exactly.
    pub fn revenue(&self) -> Result<Decimal> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(Error::Overflow("revenue of a single record"))
    }
}

/// Revenue and quantity accumulated for one category.
///
/// Equality compares revenue by magnitude, so `3.0` and `3.00` are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategoryStats {
    total_revenue: Decimal,
    total_quantity: i64,
}

impl CategoryStats {
    pub fn new(total_revenue: Decimal, total_quantity: i64) -> Self {
        Self {
            total_revenue,
            total_quantity,
        }
    }

    /// The identity of [`CategoryStats::checked_add`].
    pub fn empty() -> Self {
        Self::new(Decimal::ZERO, 0)
    }

    #[inline]
    pub fn total_revenue(&self) -> Decimal {
        self.total_revenue
    }

    #[inline]
    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    /// Component-wise sum. Associative and commutative; leaving the range of
    /// either component is reported as [`Error::Overflow`] instead of wrapping.
    pub fn checked_add(&self, other: &CategoryStats) -> Result<CategoryStats> {
        let total_revenue = self
            .total_revenue
            .checked_add(other.total_revenue)
            .ok_or(Error::Overflow("category revenue total"))?;
        let total_quantity = self
            .total_quantity
            .checked_add(other.total_quantity)
            .ok_or(Error::Overflow("category quantity total"))?;
        Ok(Self::new(total_revenue, total_quantity))
    }
}
