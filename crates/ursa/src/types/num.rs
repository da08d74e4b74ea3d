//! Number methods: IEEE-754 arithmetic, two's-complement 32-bit bitwise
//! operations, and ordered comparison.
//!
//! Bitwise operations coerce through 32-bit integers the way a modern
//! dynamic-language runtime does (ToInt32/ToUint32): truncate toward zero,
//! wrap modulo 2^32. `shiftRight` is the arithmetic (sign-extending) shift;
//! `shiftRightArith` is the logical zero-fill shift.

use crate::{
    intern::StaticName,
    types::expect_arity,
    value::Value,
};

/// Converts a double to a signed 32-bit integer (ToInt32).
#[must_use]
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let m = n.trunc().rem_euclid(4_294_967_296.0);
    if m >= 2_147_483_648.0 {
        (m - 4_294_967_296.0) as i32
    } else {
        m as i32
    }
}

/// Converts a double to an unsigned 32-bit integer (ToUint32).
#[must_use]
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Whether `Num` has a built-in method with this name.
#[must_use]
pub fn has_method(name: StaticName) -> bool {
    use StaticName as N;
    matches!(
        name,
        N::Add
            | N::Sub
            | N::Mul
            | N::Div
            | N::Mod
            | N::Pow
            | N::Min
            | N::Max
            | N::Neg
            | N::Abs
            | N::Floor
            | N::Ceil
            | N::Round
            | N::Sqrt
            | N::BitwiseAnd
            | N::BitwiseOr
            | N::BitwiseXor
            | N::BitwiseNot
            | N::ShiftLeft
            | N::ShiftRight
            | N::ShiftRightArith
            | N::Lt
            | N::Leq
            | N::Gt
            | N::Geq
    )
}

/// Invokes a `Num` method. The universal identity methods are handled by
/// the dispatcher before we get here.
pub fn invoke(receiver: f64, name: StaticName, args: &[Value]) -> Result<Value, String> {
    use StaticName as N;

    let unary = |f: fn(f64) -> f64| -> Result<Value, String> {
        let text: &'static str = name.into();
        expect_arity(text, args, 0)?;
        Ok(Value::num(f(receiver)))
    };
    let binary = |f: fn(f64, f64) -> f64| -> Result<Value, String> {
        let text: &'static str = name.into();
        expect_arity(text, args, 1)?;
        Ok(Value::num(f(receiver, num_arg(args[0], text)?)))
    };
    let comparison = |f: fn(f64, f64) -> bool| -> Result<Value, String> {
        let text: &'static str = name.into();
        expect_arity(text, args, 1)?;
        Ok(Value::Bool(f(receiver, num_arg(args[0], text)?)))
    };

    match name {
        N::Add => binary(|a, b| a + b),
        N::Sub => binary(|a, b| a - b),
        N::Mul => binary(|a, b| a * b),
        N::Div => binary(|a, b| a / b),
        N::Mod => binary(|a, b| a % b),
        N::Pow => binary(f64::powf),
        N::Min => binary(f64::min),
        N::Max => binary(f64::max),
        N::Neg => unary(|a| -a),
        N::Abs => unary(f64::abs),
        N::Floor => unary(f64::floor),
        N::Ceil => unary(f64::ceil),
        N::Round => unary(f64::round),
        N::Sqrt => unary(f64::sqrt),
        N::BitwiseAnd => binary(|a, b| f64::from(to_int32(a) & to_int32(b))),
        N::BitwiseOr => binary(|a, b| f64::from(to_int32(a) | to_int32(b))),
        N::BitwiseXor => binary(|a, b| f64::from(to_int32(a) ^ to_int32(b))),
        N::BitwiseNot => unary(|a| f64::from(!to_int32(a))),
        N::ShiftLeft => binary(|a, b| f64::from(to_int32(a) << (to_uint32(b) & 31))),
        N::ShiftRight => binary(|a, b| f64::from(to_int32(a) >> (to_uint32(b) & 31))),
        N::ShiftRightArith => binary(|a, b| f64::from(to_uint32(a) >> (to_uint32(b) & 31))),
        N::Lt => comparison(|a, b| a < b),
        N::Leq => comparison(|a, b| a <= b),
        N::Gt => comparison(|a, b| a > b),
        N::Geq => comparison(|a, b| a >= b),
        other => {
            let text: &'static str = other.into();
            Err(format!("Invalid method `{text}'"))
        }
    }
}

fn num_arg(value: Value, method: &str) -> Result<f64, String> {
    match value {
        Value::Num(n) => Ok(n),
        _ => Err(format!("`{method}' expects a Num argument")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_int32_wraps() {
        assert_eq!(to_int32(0.0), 0);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(2_147_483_648.0), -2_147_483_648);
        assert_eq!(to_int32(4_294_967_296.0), 0);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_int32(f64::INFINITY), 0);
        assert_eq!(to_int32(-5.9), -5);
    }

    #[test]
    fn shift_semantics() {
        // -8 >> 1 keeps the sign; -8 >>> 1 zero-fills
        let sra = invoke(-8.0, StaticName::ShiftRight, &[Value::num(1.0)]).unwrap();
        assert_eq!(sra, Value::num(-4.0));
        let srl = invoke(-8.0, StaticName::ShiftRightArith, &[Value::num(1.0)]).unwrap();
        assert_eq!(srl, Value::num(2_147_483_644.0));
        let shl = invoke(1.0, StaticName::ShiftLeft, &[Value::num(33.0)]).unwrap();
        assert_eq!(shl, Value::num(2.0));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(invoke(3.0, StaticName::Add, &[Value::num(4.0)]).unwrap(), Value::num(7.0));
        assert_eq!(invoke(7.0, StaticName::Mod, &[Value::num(-3.0)]).unwrap(), Value::num(1.0));
        assert_eq!(invoke(2.0, StaticName::Pow, &[Value::num(10.0)]).unwrap(), Value::num(1024.0));
        assert_eq!(invoke(2.25, StaticName::Sqrt, &[]).unwrap(), Value::num(1.5));
    }

    #[test]
    fn division_by_zero_is_infinite() {
        assert_eq!(invoke(1.0, StaticName::Div, &[Value::num(0.0)]).unwrap(), Value::num(f64::INFINITY));
    }
}
