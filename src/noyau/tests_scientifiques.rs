//! Tests scientifiques (campagne) : évaluation de bout en bout via la façade.
//!
//! - mode flottant : précédences, négations, multiplication implicite
//! - mode exact : fractions normalisées, repli flottant au dépassement
//! - erreurs : catégorie attendue, jamais de panique
//! - plages : grands / petits nombres sans entier corrompu

use super::eval::{CalcOptions, SmallCalc};
use super::fraction::Fraction64;
use super::valeur::{ErrorKind, PrimitiveValue};

fn flottant() -> SmallCalc {
    SmallCalc::new()
}

fn exact() -> SmallCalc {
    SmallCalc::with_options(CalcOptions {
        accurate: true,
        ..CalcOptions::default()
    })
}

fn complet() -> SmallCalc {
    SmallCalc::with_options(CalcOptions {
        standard_constants: true,
        standard_functions: true,
        ..CalcOptions::default()
    })
}

fn valeur(calc: &mut SmallCalc, expr: &str) -> f64 {
    let v = calc.eval(expr);
    v.to_f64()
        .unwrap_or_else(|| panic!("expr={expr:?} : valeur non numérique {v}"))
}

fn assert_proche(calc: &mut SmallCalc, expr: &str, attendu: f64, tolerance: f64) {
    let v = valeur(calc, expr);
    assert!(
        (v - attendu).abs() <= tolerance,
        "expr={expr:?} : {v} au lieu de {attendu}"
    );
}

/// Écart relatif (pour les plages extrêmes).
fn assert_relatif(calc: &mut SmallCalc, expr: &str, attendu: f64) {
    let v = valeur(calc, expr);
    assert!(
        ((v - attendu) / attendu).abs() < 1e-9,
        "expr={expr:?} : {v} au lieu de {attendu}"
    );
}

fn assert_exact(calc: &mut SmallCalc, expr: &str, attendu: &str) {
    let v = calc.eval(expr);
    assert!(v.is_accurate(), "expr={expr:?} : {v} n’est pas exact");
    assert_eq!(v.to_string(), attendu, "expr={expr:?}");
}

fn assert_erreur(calc: &mut SmallCalc, expr: &str, attendu: ErrorKind) {
    assert_eq!(calc.eval(expr).error(), Some(attendu), "expr={expr:?}");
}

/* ------------------------ Mode flottant ------------------------ */

#[test]
fn sci_evaluation_simple() {
    let mut c = flottant();
    assert_eq!(valeur(&mut c, "2"), 2.0);
    assert_eq!(valeur(&mut c, "2*2"), 4.0);
    assert_eq!(valeur(&mut c, "2*2*2"), 8.0);
    assert_eq!(valeur(&mut c, "2*3 + 4"), 10.0);
    assert_eq!(valeur(&mut c, "2+3*4"), 14.0);
    assert_eq!(valeur(&mut c, "2*3+2"), 8.0);
    assert_eq!(valeur(&mut c, "2+3*4+2"), 16.0);
    assert_eq!(valeur(&mut c, "-2"), -2.0);
    assert_eq!(valeur(&mut c, "2^2"), 4.0);
    assert_eq!(valeur(&mut c, "2^-2"), 0.25);
}

#[test]
fn sci_resultats_flottants_hors_mode_exact() {
    let mut c = flottant();
    assert_eq!(c.eval("2*2"), PrimitiveValue::Double(4.0));
    assert_eq!(c.eval("1/4"), PrimitiveValue::Double(0.25));
    // pas d’erreur en flottant : IEEE
    assert!(valeur(&mut c, "1/0").is_infinite());
}

#[test]
fn sci_multiplication_implicite_et_negations() {
    let mut c = complet();
    assert_eq!(valeur(&mut c, "2(2+4)"), 12.0);
    assert_eq!(valeur(&mut c, "4sin(0)"), 0.0);
    assert_eq!(valeur(&mut c, "3*-(-2)"), 6.0);
    assert_eq!(valeur(&mut c, "4--2"), 6.0);
    // "-3" fusionné : une seule négation
    assert_eq!(valeur(&mut c, "--3"), 3.0);
    assert_eq!(valeur(&mut c, "-(-pi)"), std::f64::consts::PI);
    assert_erreur(&mut c, "--pi", ErrorKind::NoValidToken);
}

#[test]
fn sci_constantes() {
    let mut c = flottant();
    c.add_constant("µ", PrimitiveValue::Int(2), &["\\mu"]);
    assert_eq!(valeur(&mut c, "2*\\mu"), 4.0);
    assert_eq!(valeur(&mut c, "µ^3"), 8.0);

    let mut c = complet();
    assert_proche(&mut c, "2pi", 2.0 * std::f64::consts::PI, 1e-12);
    assert_proche(&mut c, "E", std::f64::consts::E, 1e-12);
}

#[test]
fn sci_variables() {
    let mut c = flottant();
    assert_eq!(valeur(&mut c, "x=4"), 4.0);
    assert_eq!(valeur(&mut c, "x"), 4.0);
    assert_eq!(valeur(&mut c, "x=3*4-7"), 5.0);
    assert_eq!(valeur(&mut c, "x+1"), 6.0);
    // la cible doit être une variable, même à gauche d’une autre affectation
    assert_erreur(&mut c, "a=b=2", ErrorKind::BadType);
}

#[test]
fn sci_fonctions_usuelles() {
    let mut c = complet();
    assert_eq!(valeur(&mut c, "round(sin(0))"), 0.0);
    assert_eq!(valeur(&mut c, "round(cos(PI))"), -1.0);
    assert_eq!(valeur(&mut c, "round(tan(PI/4))"), 1.0);
    assert_eq!(valeur(&mut c, "round(sqrt(4))"), 2.0);
    assert_eq!(valeur(&mut c, "√(9)"), 3.0);

    let pi = std::f64::consts::PI;
    assert_proche(&mut c, "acos(0)", pi / 2.0, 0.1);
    assert_proche(&mut c, "asin(1)", pi / 2.0, 0.1);
    assert_proche(&mut c, "atan(1)", pi / 4.0, 0.1);
    assert_proche(&mut c, "cosh(1)", 1.54, 0.1);
    assert_proche(&mut c, "sinh(2)", 3.626, 0.1);
    assert_proche(&mut c, "tanh(2)", 0.964, 0.1);
    assert_proche(&mut c, "asinh(1.1752011936438014)", 1.0, 0.1);
    assert_proche(&mut c, "acosh(1.5430806348152437)", 1.0, 0.1);
    assert_proche(&mut c, "atanh(0.76159415595576485)", 1.0, 0.1);
    assert_proche(&mut c, "ln(e^2)", 2.0, 0.1);
    assert_eq!(valeur(&mut c, "abs(-3.4)"), 3.4);
}

/* ------------------------ Mode exact ------------------------ */

#[test]
fn sci_fractions_exactes() {
    let mut c = exact();
    assert_exact(&mut c, "2/2", "1");
    assert_exact(&mut c, "2/3", "2/3");
    assert_exact(&mut c, "4/6", "2/3");
    assert_exact(&mut c, "2/6*2", "2/3");
    assert_exact(&mut c, "2/-10", "-1/5");
    assert_exact(&mut c, "4/5+1/5", "1");
    assert_exact(&mut c, "1-1/5", "4/5");
    assert_exact(&mut c, "1-6/5", "-1/5");
    assert_exact(&mut c, "2/6", "1/3");
    assert_exact(&mut c, "1/2*2/3", "1/3");
    assert_eq!(
        c.eval("2/6*2"),
        PrimitiveValue::Fraction(Fraction64::new(2, 3))
    );
}

#[test]
fn sci_puissances_exactes() {
    let mut c = exact();
    assert_exact(&mut c, "1^0", "1");
    assert_exact(&mut c, "1^1", "1");
    assert_exact(&mut c, "1^2", "1");
    assert_exact(&mut c, "2^2", "4");
    assert_exact(&mut c, "2^3", "8");
    assert_exact(&mut c, "2^-1", "1/2");
    assert_exact(&mut c, "2^-2", "1/4");
    assert_exact(&mut c, "2^-3", "1/8");
    assert_exact(&mut c, "(1/2)^2", "1/4");
    assert_exact(&mut c, "(1/2)^3", "1/8");
    assert_exact(&mut c, "(1/2)^-2", "4");
    assert_exact(&mut c, "(1/2)^-3", "8");
    assert_exact(&mut c, "(1/10)^18", "1/1000000000000000000");
    assert_exact(&mut c, "(-2)^3", "-8");
}

#[test]
fn sci_exposant_non_entier_repli_flottant() {
    let mut c = exact();
    let v = c.eval("4^0.5");
    assert_eq!(v, PrimitiveValue::Double(2.0));
    assert!(!v.is_accurate());
}

#[test]
fn sci_unaires_exacts() {
    let mut c = exact();
    c.add_standard_functions();
    assert_exact(&mut c, "-(1/3)", "-1/3");
    assert_exact(&mut c, "abs(-2/3)", "2/3");
    assert_exact(&mut c, "round(7/2)", "4");
    assert_exact(&mut c, "round(-7/2)", "-4");
    // sin reste flottant
    assert!(!c.eval("sin(0)").is_accurate());
}

#[test]
fn sci_melange_exact_flottant() {
    let mut c = exact();
    // un argument flottant : tout le calcul passe en flottant
    assert_eq!(c.eval("1/2 + 0.5"), PrimitiveValue::Double(1.0));
    assert_eq!(c.eval("1/4 * 2.0"), PrimitiveValue::Double(0.5));
}

#[test]
fn sci_bascule_du_mode() {
    let mut c = flottant();
    assert_eq!(c.eval("1/4"), PrimitiveValue::Double(0.25));
    c.set_accurate_level(true);
    assert_exact(&mut c, "1/4", "1/4");
    c.set_accurate_level(false);
    assert_eq!(c.eval("1/4"), PrimitiveValue::Double(0.25));
}

/* ------------------------ Plages ------------------------ */

#[test]
fn sci_plages_extremes() {
    let mut c = exact();
    assert_relatif(&mut c, "1e21", 1e21);
    assert_relatif(&mut c, "1000000000000000000000", 1e21);
    assert_relatif(&mut c, "1000^8", 1e24);
    assert_relatif(&mut c, "-1000*1000^7", -1e24);
    assert_relatif(&mut c, "1/10^17 + 1/(10^17+1)", 2e-17);
    assert_proche(&mut c, "1/10^17 - 1/(10^17+1)", 0.0, 1e-30);
    assert_relatif(&mut c, "(1/10)^21", 1e-21);
}

#[test]
fn sci_depassement_jamais_corrompu() {
    let mut c = exact();
    // i64::MAX + 1 : pas de valeur enroulée
    let v = c.eval("9223372036854775807 + 1");
    assert!(matches!(v, PrimitiveValue::Double(_)), "{v}");
    assert!(valeur(&mut c, "9223372036854775807 + 1") > 9e18);

    let v = c.eval("3037000500*3037000500");
    assert!(matches!(v, PrimitiveValue::Double(_)), "{v}");

    // juste sous la limite : reste exact
    assert_exact(&mut c, "3037000499*3037000499", "9223372030926249001");
}

/* ------------------------ Erreurs ------------------------ */

#[test]
fn sci_erreurs_evaluation() {
    let mut c = flottant();
    assert_erreur(&mut c, "4*x", ErrorKind::UnboundVariable);
    assert_erreur(&mut c, "3=4", ErrorKind::BadType);

    let mut c = complet();
    assert_erreur(&mut c, "PI=4", ErrorKind::BadType);

    let mut c = exact();
    assert_erreur(&mut c, "1/0", ErrorKind::DivisionByZero);
    assert_erreur(&mut c, "1/(2-2)", ErrorKind::DivisionByZero);
    assert_erreur(&mut c, "0^0", ErrorKind::DivisionByZero);
    assert_erreur(&mut c, "0^-1", ErrorKind::DivisionByZero);
}

#[test]
fn sci_erreurs_de_parse() {
    let mut c = complet();
    assert_erreur(&mut c, "(3+4))", ErrorKind::ParenthesisMismatch);
    assert_erreur(&mut c, "((3+4)", ErrorKind::ParenthesisMismatch);
    assert_erreur(&mut c, "", ErrorKind::NoTokens);
    assert_erreur(&mut c, "   ", ErrorKind::NoTokens);
    assert_erreur(&mut c, "2 + +", ErrorKind::NoValidToken);
    assert_erreur(&mut c, "sin(1,2)", ErrorKind::WrongArgumentCount);
}

#[test]
fn sci_erreur_court_circuite() {
    let mut c = exact();
    // la première erreur (gauche à droite) remonte telle quelle
    assert_erreur(&mut c, "y + 1/0", ErrorKind::UnboundVariable);
    assert_erreur(&mut c, "1/0 + y", ErrorKind::DivisionByZero);
    // l’affectation n’a pas eu lieu
    assert_erreur(&mut c, "z = 1/0", ErrorKind::DivisionByZero);
    assert_erreur(&mut c, "z", ErrorKind::UnboundVariable);
}

#[test]
fn sci_position_de_l_erreur() {
    let mut c = flottant();
    let v = c.eval("(3+4))");
    let e = v.as_error().expect("erreur attendue");
    assert_eq!(e.position, Some(5));
}
