//! Numeric literals: integers, normalized rationals, and decimal floats.
//!
//! Structural equality (`PartialEq`) is type-strict, matching the graph
//! comparison rules; the `numeric_*` helpers promote before comparing.
//! Arithmetic returns `None` on overflow or division by zero, which the
//! calculator treats as "leave the expression symbolic".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    /// Invariant: denominator > 0, gcd(numerator, denominator) == 1,
    /// denominator != 1.
    Ratio(i64, i64),
    Float(Decimal),
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn decimal_powi(base: Decimal, exp: i64) -> Option<Decimal> {
    if exp < 0 {
        let pos = decimal_powi(base, -exp)?;
        if pos.is_zero() {
            return None;
        }
        return Some(Decimal::ONE / pos);
    }
    let mut acc = Decimal::ONE;
    for _ in 0..exp {
        acc = acc.checked_mul(base)?;
    }
    Some(acc)
}

impl Value {
    /// Builds a normalized rational; integers collapse to [`Value::Int`].
    pub fn ratio(num: i64, den: i64) -> Option<Value> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den);
        let (num, den) = if g == 0 { (0, 1) } else { (sign * num / g, sign * den / g) };
        if den == 1 {
            Some(Value::Int(num))
        } else {
            Some(Value::Ratio(num, den))
        }
    }

    /// Parses a digit-run literal: a decimal point makes it a float.
    pub fn from_literal(text: &str) -> Option<Value> {
        if text.contains('.') {
            Decimal::from_str(text).ok().map(Value::Float)
        } else {
            text.parse::<i64>().ok().map(Value::Int)
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_decimal(&self) -> Decimal {
        match self {
            Value::Int(n) => Decimal::from(*n),
            Value::Ratio(n, d) => Decimal::from(*n) / Decimal::from(*d),
            Value::Float(d) => *d,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(n) => *n == 0,
            Value::Ratio(n, _) => *n == 0,
            Value::Float(d) => d.is_zero(),
        }
    }

    pub fn is_one(&self) -> bool {
        self.numeric_eq(&Value::Int(1))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Int(n) => *n < 0,
            Value::Ratio(n, _) => *n < 0,
            Value::Float(d) => d.is_sign_negative() && !d.is_zero(),
        }
    }

    pub fn abs(&self) -> Value {
        match self {
            Value::Int(n) => Value::Int(n.abs()),
            Value::Ratio(n, d) => Value::Ratio(n.abs(), *d),
            Value::Float(d) => Value::Float(d.abs()),
        }
    }

    pub fn negate(&self) -> Option<Value> {
        match self {
            Value::Int(n) => n.checked_neg().map(Value::Int),
            Value::Ratio(n, d) => n.checked_neg().map(|n| Value::Ratio(n, *d)),
            Value::Float(d) => Some(Value::Float(-*d)),
        }
    }

    pub fn add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int),
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                self.to_decimal().checked_add(other.to_decimal()).map(Value::Float)
            }
            _ => {
                let (an, ad) = self.as_ratio_parts();
                let (bn, bd) = other.as_ratio_parts();
                let num = an.checked_mul(bd)?.checked_add(bn.checked_mul(ad)?)?;
                Value::ratio(num, ad.checked_mul(bd)?)
            }
        }
    }

    pub fn sub(&self, other: &Value) -> Option<Value> {
        self.add(&other.negate()?)
    }

    pub fn mul(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int),
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                self.to_decimal().checked_mul(other.to_decimal()).map(Value::Float)
            }
            _ => {
                let (an, ad) = self.as_ratio_parts();
                let (bn, bd) = other.as_ratio_parts();
                Value::ratio(an.checked_mul(bn)?, ad.checked_mul(bd)?)
            }
        }
    }

    pub fn div(&self, other: &Value) -> Option<Value> {
        if other.is_zero() {
            return None;
        }
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                self.to_decimal().checked_div(other.to_decimal()).map(Value::Float)
            }
            _ => {
                let (an, ad) = self.as_ratio_parts();
                let (bn, bd) = other.as_ratio_parts();
                Value::ratio(an.checked_mul(bd)?, ad.checked_mul(bn)?)
            }
        }
    }

    /// Raises to an integer power; any other exponent stays symbolic.
    pub fn pow(&self, exp: &Value) -> Option<Value> {
        let e = exp.as_int()?;
        match self {
            Value::Int(n) => {
                if e >= 0 {
                    n.checked_pow(u32::try_from(e).ok()?).map(Value::Int)
                } else {
                    let p = n.checked_pow(u32::try_from(-e).ok()?)?;
                    Value::ratio(1, p)
                }
            }
            Value::Ratio(n, d) => {
                if e >= 0 {
                    let k = u32::try_from(e).ok()?;
                    Value::ratio(n.checked_pow(k)?, d.checked_pow(k)?)
                } else {
                    let k = u32::try_from(-e).ok()?;
                    Value::ratio(d.checked_pow(k)?, n.checked_pow(k)?)
                }
            }
            Value::Float(d) => decimal_powi(*d, e).map(Value::Float),
        }
    }

    /// Promoting equality across the tower.
    pub fn numeric_eq(&self, other: &Value) -> bool {
        self.numeric_cmp(other) == Some(Ordering::Equal)
    }

    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                Some(self.to_decimal().cmp(&other.to_decimal()))
            }
            _ => {
                let (an, ad) = self.as_ratio_parts();
                let (bn, bd) = other.as_ratio_parts();
                Some((an.checked_mul(bd)?).cmp(&bn.checked_mul(ad)?))
            }
        }
    }

    fn as_ratio_parts(&self) -> (i64, i64) {
        match self {
            Value::Int(n) => (*n, 1),
            Value::Ratio(n, d) => (*n, *d),
            Value::Float(_) => (0, 1),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Ratio(n, d) => {
                if *n < 0 {
                    write!(f, "-\\frac{{{}}}{{{}}}", -n, d)
                } else {
                    write!(f, "\\frac{{{}}}{{{}}}", n, d)
                }
            }
            Value::Float(d) => write!(f, "{d}"),
        }
    }
}
