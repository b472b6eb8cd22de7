//! The numeric library visible to expressions, as `Math.name` or bare `name`.
//!
//! Everything here is pure: the same arguments always give the same result,
//! so a compiled expression stays deterministic. There is deliberately no
//! random number source.

use std::f64::consts;

/// A resolved library entry.
#[derive(Debug, Clone, Copy)]
pub enum Builtin {
    Constant(f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    /// Takes one or more arguments.
    Variadic(fn(&[f64]) -> f64),
}

impl Builtin {
    /// Human-readable arity for error messages.
    pub fn arity(&self) -> &'static str {
        match self {
            Builtin::Constant(_) => "0",
            Builtin::Unary(_) => "1",
            Builtin::Binary(_) => "2",
            Builtin::Variadic(_) => "at least 1",
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Builtin::Constant(_) => false,
            Builtin::Unary(_) => count == 1,
            Builtin::Binary(_) => count == 2,
            Builtin::Variadic(_) => count >= 1,
        }
    }
}

/// Look up `name`, which may carry a `Math.` prefix.
pub fn lookup(name: &str) -> Option<Builtin> {
    let bare = name.strip_prefix("Math.").unwrap_or(name);
    if bare.contains('.') {
        return None;
    }
    let builtin = match bare {
        // Constants
        "PI" => Builtin::Constant(consts::PI),
        "E" => Builtin::Constant(consts::E),
        "TAU" => Builtin::Constant(consts::TAU),
        "LN2" => Builtin::Constant(consts::LN_2),
        "LN10" => Builtin::Constant(consts::LN_10),
        "LOG2E" => Builtin::Constant(consts::LOG2_E),
        "LOG10E" => Builtin::Constant(consts::LOG10_E),
        "SQRT2" => Builtin::Constant(consts::SQRT_2),
        "SQRT1_2" => Builtin::Constant(consts::FRAC_1_SQRT_2),

        // Trigonometry
        "sin" => Builtin::Unary(f64::sin),
        "cos" => Builtin::Unary(f64::cos),
        "tan" => Builtin::Unary(f64::tan),
        "asin" => Builtin::Unary(f64::asin),
        "acos" => Builtin::Unary(f64::acos),
        "atan" => Builtin::Unary(f64::atan),
        "sinh" => Builtin::Unary(f64::sinh),
        "cosh" => Builtin::Unary(f64::cosh),
        "tanh" => Builtin::Unary(f64::tanh),
        "asinh" => Builtin::Unary(f64::asinh),
        "acosh" => Builtin::Unary(f64::acosh),
        "atanh" => Builtin::Unary(f64::atanh),
        "atan2" => Builtin::Binary(f64::atan2),

        // Exponentials
        "exp" => Builtin::Unary(f64::exp),
        "expm1" => Builtin::Unary(f64::exp_m1),
        "log" => Builtin::Unary(f64::ln),
        "log2" => Builtin::Unary(f64::log2),
        "log10" => Builtin::Unary(f64::log10),
        "log1p" => Builtin::Unary(f64::ln_1p),
        "sqrt" => Builtin::Unary(f64::sqrt),
        "cbrt" => Builtin::Unary(f64::cbrt),
        "pow" => Builtin::Binary(f64::powf),

        // Rounding & sign
        "abs" => Builtin::Unary(f64::abs),
        "sign" => Builtin::Unary(sign),
        "floor" => Builtin::Unary(f64::floor),
        "ceil" => Builtin::Unary(f64::ceil),
        "round" => Builtin::Unary(round),
        "trunc" => Builtin::Unary(f64::trunc),

        // Variadic
        "min" => Builtin::Variadic(min),
        "max" => Builtin::Variadic(max),
        "hypot" => Builtin::Variadic(hypot),

        _ => return None,
    };
    Some(builtin)
}

/// Rounds half-way cases towards +∞ (`round(-2.5) == -2`).
pub fn round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    (x + 0.5).floor()
}

/// `-1`, `1`, or the argument itself for `±0` and NaN.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// NaN in, NaN out (unlike [`f64::min`]).
fn min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.min(x) }
    })
}

fn max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.max(x) }
    })
}

fn hypot(args: &[f64]) -> f64 {
    args.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unary(name: &str) -> fn(f64) -> f64 {
        match lookup(name) {
            Some(Builtin::Unary(f)) => f,
            other => panic!("{name} is not unary: {other:?}"),
        }
    }

    #[test]
    fn math_prefix_is_optional() {
        assert!(matches!(lookup("Math.sin"), Some(Builtin::Unary(_))));
        assert!(matches!(lookup("sin"), Some(Builtin::Unary(_))));
        assert!(matches!(lookup("Math.PI"), Some(Builtin::Constant(c)) if c == consts::PI));
    }

    #[test]
    fn unknown_names() {
        assert!(lookup("random").is_none());
        assert!(lookup("Math.random").is_none());
        assert!(lookup("Math.Math.sin").is_none());
        assert!(lookup("Foo.sin").is_none());
    }

    #[test]
    fn round_goes_half_up() {
        let round = unary("round");
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(-2.6), -3.0);
        assert_eq!(round(440.0 * 0.25), 110.0);
    }

    #[test]
    fn sign_keeps_zero() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(0.0), 0.0);
        assert!(sign(f64::NAN).is_nan());
    }

    #[test]
    fn variadic_min_max_hypot() {
        assert_eq!(min(&[3.0, -1.0, 2.0]), -1.0);
        assert_eq!(max(&[3.0, -1.0, 2.0]), 3.0);
        assert!(max(&[1.0, f64::NAN]).is_nan());
        assert_eq!(hypot(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn arity_checks() {
        let sin = lookup("sin").unwrap();
        assert!(sin.accepts(1));
        assert!(!sin.accepts(2));
        let max = lookup("max").unwrap();
        assert!(!max.accepts(0));
        assert!(max.accepts(5));
        assert!(!lookup("PI").unwrap().accepts(0));
    }
}
