//! Exact money arithmetic in minor currency units.

use serde::{Deserialize, Serialize};

/// ISO currency codes accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Vnd,
}

impl Currency {
    /// Number of minor units per major unit (100 for decimal currencies,
    /// 1 for zero-decimal currencies such as VND).
    pub fn minor_units_per_major(&self) -> i64 {
        match self {
            Currency::Usd | Currency::Eur | Currency::Gbp => 100,
            Currency::Vnd => 1,
        }
    }

    /// Returns the ISO 4217 code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Vnd => "VND",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money amount in minor units of a currency.
///
/// All arithmetic is integer arithmetic on the minor-unit amount; the only
/// place fractions appear is percentage splits, which round half away from
/// zero to the nearest minor unit.
///
/// Mixing currencies in arithmetic is a programming error and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Creates a money amount from minor units.
    pub fn from_minor(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a money amount from whole major units.
    pub fn from_major(major: i64, currency: Currency) -> Self {
        Self {
            amount: major * currency.minor_units_per_major(),
            currency,
        }
    }

    /// Returns zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Adds another money amount of the same currency.
    pub fn add(&self, other: Money) -> Money {
        self.assert_same_currency(other);
        Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        }
    }

    /// Subtracts another money amount of the same currency.
    pub fn subtract(&self, other: Money) -> Money {
        self.assert_same_currency(other);
        Money {
            amount: self.amount - other.amount,
            currency: self.currency,
        }
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            amount: self.amount * quantity as i64,
            currency: self.currency,
        }
    }

    /// Takes a percentage of the amount, rounded to the nearest minor unit.
    pub fn percentage(&self, percent: f64) -> Money {
        Money {
            amount: (self.amount as f64 * percent / 100.0).round() as i64,
            currency: self.currency,
        }
    }

    fn assert_same_currency(&self, other: Money) {
        assert_eq!(
            self.currency, other.currency,
            "money arithmetic across currencies: {} vs {}",
            self.currency, other.currency
        );
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factor = self.currency.minor_units_per_major();
        if factor == 1 {
            return write!(f, "{} {}", self.amount, self.currency);
        }
        let major = self.amount / factor;
        let minor = (self.amount % factor).abs();
        if self.amount < 0 && major == 0 {
            write!(f, "-{}.{:02} {}", major, minor, self.currency)
        } else {
            write!(f, "{}.{:02} {}", major, minor, self.currency)
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::add(&self, rhs)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.add(rhs);
    }
}
