// src/noyau/standard.rs
//
// Rappels d’évaluation : opérateurs fondamentaux (+ * - / négation ^ =),
// fonctions usuelles, constantes.
//
// Mode exact (contexte.accurate) :
// - entiers / fractions d’abord, avec drapeau de dépassement
// - au premier dépassement, ou dès qu’un argument est flottant :
//   recalcul flottant de TOUS les arguments (jamais de mélange)
// - toute erreur en argument est renvoyée telle quelle

use log::trace;

use super::contexte::ParserContext;
use super::expr::{EvaluationContext, Expression};
use super::fonctions::{Arity, FunctionId, FunctionRegistry, NamedFunction, Notation};
use super::fraction::{
    abs_with_overflow_check, add_fractions, div_fractions, mult_fractions, sub_fractions,
    Fraction64,
};
use super::valeur::{CalcError, ErrorKind, PrimitiveValue};

/* ------------------------ Outils ------------------------ */

fn first_error(args: &[PrimitiveValue]) -> Option<PrimitiveValue> {
    args.iter().find(|a| a.error().is_some()).cloned()
}

fn invalid_argument() -> PrimitiveValue {
    PrimitiveValue::error_value(ErrorKind::InvalidOperation, "Invalid argument")
}

fn wrong_count() -> PrimitiveValue {
    PrimitiveValue::error_value(ErrorKind::InvalidOperation, "Invalid argument count")
}

/// Tous les arguments en flottants (None si l’un n’est pas numérique).
fn doubles(args: &[PrimitiveValue]) -> Option<Vec<f64>> {
    args.iter().map(PrimitiveValue::to_f64).collect()
}

/// Pli exact ; None = repli flottant nécessaire.
fn accurate_fold(
    args: &[PrimitiveValue],
    neutre: i64,
    op: fn(&Fraction64, &Fraction64, &mut bool) -> Fraction64,
) -> Option<PrimitiveValue> {
    let mut overflow = false;
    let mut acc = Fraction64::from(neutre);
    for a in args {
        let f = a.as_fraction()?;
        acc = op(&acc, &f, &mut overflow);
        if overflow {
            return None;
        }
    }
    Some(PrimitiveValue::from_fraction(acc))
}

/// Opération binaire exacte ; None = repli flottant.
fn accurate_binary(
    a: &PrimitiveValue,
    b: &PrimitiveValue,
    op: fn(&Fraction64, &Fraction64, &mut bool) -> Fraction64,
) -> Option<PrimitiveValue> {
    let (fa, fb) = (a.as_fraction()?, b.as_fraction()?);
    let mut overflow = false;
    let r = op(&fa, &fb, &mut overflow);
    (!overflow).then(|| PrimitiveValue::from_fraction(r))
}

/* ------------------------ Fondamentaux ------------------------ */

pub fn add(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    if let Some(e) = first_error(args) {
        return e;
    }
    if ctx.accurate() {
        if let Some(v) = accurate_fold(args, 0, add_fractions) {
            return v;
        }
        trace!("add : repli flottant");
    }
    match doubles(args) {
        Some(xs) => PrimitiveValue::Double(xs.iter().sum()),
        None => invalid_argument(),
    }
}

pub fn multiply(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    if let Some(e) = first_error(args) {
        return e;
    }
    if ctx.accurate() {
        if let Some(v) = accurate_fold(args, 1, mult_fractions) {
            return v;
        }
        trace!("multiply : repli flottant");
    }
    match doubles(args) {
        Some(xs) => PrimitiveValue::Double(xs.iter().product()),
        None => invalid_argument(),
    }
}

pub fn subtract(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    let [a, b] = args else {
        return wrong_count();
    };
    if let Some(e) = first_error(args) {
        return e;
    }
    if ctx.accurate() {
        if let Some(v) = accurate_binary(a, b, sub_fractions) {
            return v;
        }
        trace!("subtract : repli flottant");
    }
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) => PrimitiveValue::Double(x - y),
        _ => invalid_argument(),
    }
}

pub fn divide(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    let [a, b] = args else {
        return wrong_count();
    };
    if let Some(e) = first_error(args) {
        return e;
    }
    if ctx.accurate() && a.is_accurate() {
        if let PrimitiveValue::Int(0) = b {
            return PrimitiveValue::error_value(ErrorKind::DivisionByZero, "Division by zero");
        }
        if let Some(v) = accurate_binary(a, b, div_fractions) {
            return v;
        }
        trace!("divide : repli flottant");
    }
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) => PrimitiveValue::Double(x / y),
        _ => invalid_argument(),
    }
}

pub fn negate(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    let [a] = args else {
        return wrong_count();
    };
    if a.error().is_some() {
        return a.clone();
    }
    if ctx.accurate() {
        if let Some(f) = a.as_fraction() {
            // -min n’est pas représentable
            if f.numerator() != i64::MIN {
                return PrimitiveValue::from_fraction(f.negation());
            }
        }
    }
    match a.to_f64() {
        Some(x) => PrimitiveValue::Double(-x),
        None => invalid_argument(),
    }
}

/// Puissance exacte : exposant entier, carré-et-multiplie ; None = repli flottant.
fn accurate_power(base: Fraction64, exposant: i64) -> Option<PrimitiveValue> {
    if exposant == 0 {
        if base.numerator() == 0 {
            return Some(PrimitiveValue::error_value(
                ErrorKind::DivisionByZero,
                "0^0 is not defined",
            ));
        }
        return Some(PrimitiveValue::Int(1));
    }
    if base == Fraction64::from(1) {
        return Some(PrimitiveValue::Int(1));
    }

    let mut overflow = false;
    let mut result = Fraction64::from(1);
    let mut carre = base;
    let mut e = exposant.unsigned_abs();
    while e > 0 {
        if e & 1 == 1 {
            result = mult_fractions(&result, &carre, &mut overflow);
        }
        e >>= 1;
        if e > 0 {
            carre = mult_fractions(&carre, &carre, &mut overflow);
        }
        if overflow {
            return None;
        }
    }

    if exposant < 0 {
        result = div_fractions(&Fraction64::from(1), &result, &mut overflow);
        if overflow {
            return None;
        }
    }
    // 0^-n : fraction invalide -> DivisionByZero
    Some(PrimitiveValue::from_fraction(result))
}

pub fn pow(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    let [a, b] = args else {
        return wrong_count();
    };
    if let Some(e) = first_error(args) {
        return e;
    }
    if ctx.accurate() {
        // exposant non entier : repli flottant d’office
        if let (Some(base), PrimitiveValue::Int(n)) = (a.as_fraction(), b) {
            if let Some(v) = accurate_power(base, *n) {
                return v;
            }
        }
        trace!("pow : repli flottant");
    }
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) => PrimitiveValue::Double(x.powf(y)),
        _ => invalid_argument(),
    }
}

fn build_assignment(_: FunctionId, args: Vec<Expression>) -> Result<Expression, CalcError> {
    let Ok([target, value]) = <[Expression; 2]>::try_from(args) else {
        return Err(CalcError::new(
            ErrorKind::WrongArgumentCount,
            "assignment needs a target and a value",
        ));
    };
    Ok(Expression::Assignment {
        target: Box::new(target),
        value: Box::new(value),
    })
}

/// Opérateurs toujours présents (nom, symbole, arité, notation, précédence).
pub fn register_fundamentals(reg: &mut FunctionRegistry) {
    let infix = |name: &str, symbol: &str, arity: Arity, precedence: i32| {
        NamedFunction::new(name)
            .with_printing_name(symbol)
            .with_arity(arity)
            .with_notation(Notation::Infix)
            .with_precedence(precedence)
    };

    reg.register(
        infix("add", "+", Arity::AtLeast(0), 2)
            .with_associative(true)
            .with_eval(add),
    );
    reg.register(
        infix("multiply", "*", Arity::AtLeast(0), 3)
            .with_associative(true)
            .with_eval(multiply),
    );
    reg.register(infix("subtract", "-", Arity::Exact(2), 2).with_eval(subtract));
    reg.register(infix("divide", "/", Arity::Exact(2), 3).with_eval(divide));
    reg.register(
        NamedFunction::new("negate")
            .with_printing_name("-")
            .with_notation(Notation::Prefix)
            .with_precedence(10)
            .with_eval(negate),
    );
    reg.register(infix("pow", "^", Arity::Exact(2), 4).with_eval(pow));
    reg.register(infix("assignment", "=", Arity::Exact(2), 1).with_tree_builder(build_assignment));
}

/* ------------------------ Fonctions usuelles ------------------------ */

fn unary_float(args: &[PrimitiveValue], f: fn(f64) -> f64) -> PrimitiveValue {
    match args {
        [a] if a.error().is_some() => a.clone(),
        [a] => match a.to_f64() {
            Some(x) => PrimitiveValue::Double(f(x)),
            None => invalid_argument(),
        },
        _ => wrong_count(),
    }
}

pub fn abs(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    if let ([a], true) = (args, ctx.accurate()) {
        if let Some(f) = a.as_fraction() {
            let mut overflow = false;
            let n = abs_with_overflow_check(f.numerator(), &mut overflow);
            if !overflow {
                return PrimitiveValue::from_fraction(Fraction64::new(n, f.denominator()));
            }
        }
    }
    unary_float(args, f64::abs)
}

/// Arrondi au plus proche, moitiés loin de zéro.
pub fn round(args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
    if let ([a], true) = (args, ctx.accurate()) {
        if let Some(f) = a.as_fraction() {
            let (n, d) = (f.numerator(), f.denominator());
            let (q, r) = (n / d, n % d);
            // |r| < d : r >= d - r sans débordement
            let arrondi = if r.abs() >= d - r.abs() {
                q + r.signum()
            } else {
                q
            };
            return PrimitiveValue::Int(arrondi);
        }
    }
    unary_float(args, f64::round)
}

/// (nom, rappel flottant) des fonctions unaires usuelles.
const USUELLES: [(&str, fn(f64) -> f64); 14] = [
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("sqrt", f64::sqrt),
    ("acos", f64::acos),
    ("asin", f64::asin),
    ("atan", f64::atan),
    ("cosh", f64::cosh),
    ("sinh", f64::sinh),
    ("tanh", f64::tanh),
    ("acosh", f64::acosh),
    ("asinh", f64::asinh),
    ("atanh", f64::atanh),
    ("ln", f64::ln),
];

pub fn register_standard_functions(ctx: &mut ParserContext) {
    for (name, f) in USUELLES {
        let mut fonction = NamedFunction::new(name).with_eval(move |args, _| unary_float(args, f));
        if name == "sqrt" {
            fonction = fonction.with_printing_name("√");
        }
        ctx.add_function(fonction);
    }
    ctx.add_function(NamedFunction::new("round").with_eval(round));
    ctx.add_function(NamedFunction::new("abs").with_eval(abs));
}

pub fn register_standard_constants(ctx: &mut ParserContext) {
    ctx.add_constant(
        "π",
        PrimitiveValue::Double(std::f64::consts::PI),
        &["PI", "pi"],
    );
    ctx.add_constant("e", PrimitiveValue::Double(std::f64::consts::E), &["E"]);
}
