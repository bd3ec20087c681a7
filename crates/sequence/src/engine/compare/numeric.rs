//! Numeric promotion shared by the comparers.

use core::cmp::Ordering;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use super::key::ComparisonKey;
use crate::engine::runtime::Error;
use crate::xdm::XdmAtomicValue;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Numeric<'a> {
    Int(i64),
    Big(&'a BigInt),
    Float(f64),
}

pub(crate) fn classify(v: &XdmAtomicValue) -> Option<Numeric<'_>> {
    Some(match v {
        XdmAtomicValue::Integer(i) => Numeric::Int(*i),
        XdmAtomicValue::BigInteger(b) => Numeric::Big(b),
        XdmAtomicValue::Decimal(d) | XdmAtomicValue::Double(d) => Numeric::Float(*d),
        XdmAtomicValue::Float(f) => Numeric::Float(f64::from(*f)),
        _ => return None,
    })
}

fn to_big(n: Numeric<'_>) -> Option<BigInt> {
    match n {
        Numeric::Int(i) => Some(BigInt::from(i)),
        Numeric::Big(b) => Some(b.clone()),
        Numeric::Float(_) => None,
    }
}

/// Exact comparison of an integer against a finite or infinite double.
fn cmp_integer_float(int: &BigInt, f: f64) -> Ordering {
    if f.is_infinite() {
        return if f > 0.0 { Ordering::Less } else { Ordering::Greater };
    }
    let floor = f.floor();
    let Some(floor_big) = BigInt::from_f64(floor) else {
        return Ordering::Equal;
    };
    match int.cmp(&floor_big) {
        Ordering::Equal if floor == f => Ordering::Equal,
        Ordering::Equal => Ordering::Less,
        other => other,
    }
}

/// Compare two non-NaN numerics on the common numeric line.
pub(crate) fn compare_numeric(a: Numeric<'_>, b: Numeric<'_>) -> Ordering {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => x.cmp(&y),
        (Numeric::Float(x), Numeric::Float(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Numeric::Float(x), other) => match to_big(other) {
            Some(big) => cmp_integer_float(&big, x).reverse(),
            None => Ordering::Equal,
        },
        (other, Numeric::Float(y)) => match to_big(other) {
            Some(big) => cmp_integer_float(&big, y),
            None => Ordering::Equal,
        },
        (x, y) => match (to_big(x), to_big(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

pub(crate) fn is_nan(n: Numeric<'_>) -> bool {
    matches!(n, Numeric::Float(f) if f.is_nan())
}

/// Key that makes numerically equal values of different types collide.
pub(crate) fn numeric_key(n: Numeric<'_>) -> ComparisonKey {
    match n {
        Numeric::Int(i) => ComparisonKey::Integer(i),
        Numeric::Big(b) => match b.to_i64() {
            Some(i) => ComparisonKey::Integer(i),
            None => ComparisonKey::BigInteger(b.clone()),
        },
        Numeric::Float(f) if f.is_nan() => ComparisonKey::NaN,
        Numeric::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if let Some(i) = f.to_i64() {
                ComparisonKey::Integer(i)
            } else if let Some(big) = BigInt::from_f64(f) {
                ComparisonKey::BigInteger(big)
            } else {
                ComparisonKey::Double(f.to_bits())
            }
        }
        Numeric::Float(f) => ComparisonKey::Double(f.to_bits()),
    }
}

/// Three-way comparison with NaN equal to NaN and below every other number.
pub(crate) fn compare_nan_least(a: Numeric<'_>, b: Numeric<'_>) -> Ordering {
    match (is_nan(a), is_nan(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_numeric(a, b),
    }
}

pub(crate) fn require_numeric(v: &XdmAtomicValue) -> Result<Numeric<'_>, Error> {
    classify(v).ok_or_else(|| Error::incomparable("Numeric sort keys", "xs:double", v.type_name()))
}
