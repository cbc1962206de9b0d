//! Tests fuzz safe : robustesse + déterminisme + limites contrôlées.
//!
//! But : marteler le pipeline sans brûler la machine.
//! - RNG déterministe (seed fixe) + propriétés proptest
//! - profondeur bornée
//! - budget temps global
//! - invariant clé : jamais de panique, toute erreur est une valeur
//!   d’une catégorie attendue

use std::time::{Duration, Instant};

use proptest::prelude::*;

use super::eval::{CalcOptions, SmallCalc};
use super::fraction::{
    add_with_overflow_check, gcd, mult_with_overflow_check, sub_with_overflow_check, Fraction64,
};
use super::valeur::{ErrorKind, PrimitiveValue};

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
    fn coin(&mut self) -> bool {
        (self.next_u32() & 1) == 1
    }
}

/* ------------------------ Budget anti-gel ------------------------ */

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Génération d’expressions (bornée) ------------------------ */

fn gen_atom(rng: &mut Rng) -> String {
    match rng.pick(6) {
        0 => "x".to_string(),
        1 => "pi".to_string(),
        2 => format!("{}.5", rng.pick(10)),
        3 => "0".to_string(),
        _ => {
            let n = rng.pick(12) as i64 - 3;
            n.to_string()
        }
    }
}

fn gen_expr(rng: &mut Rng, depth: usize) -> String {
    if depth == 0 {
        return gen_atom(rng);
    }
    let sous = |rng: &mut Rng| gen_expr(rng, depth - 1);

    match rng.pick(10) {
        0 => gen_atom(rng),
        1 => format!("({}+{})", sous(rng), sous(rng)),
        2 => format!("({}-{})", sous(rng), sous(rng)),
        3 => format!("{}*{}", sous(rng), sous(rng)),
        4 => format!("({}/{})", sous(rng), sous(rng)),
        5 => format!("({})^{}", sous(rng), rng.pick(5) as i64 - 2),
        6 => format!("-({})", sous(rng)),
        7 => format!("sqrt({})", sous(rng)),
        8 => format!("round({})", sous(rng)),
        _ => {
            // multiplication implicite
            if rng.coin() {
                format!("{}({})", rng.pick(9) + 1, sous(rng))
            } else {
                format!("{}x", rng.pick(9) + 1)
            }
        }
    }
}

/// Texte brouillé : fragments valides et invalides mélangés.
fn gen_bruit(rng: &mut Rng, longueur: usize) -> String {
    const MORCEAUX: [&str; 16] = [
        "(", ")", "+", "-", "*", "/", "^", ",", "=", "2", "3.5e", "e-", "x", "sin", " ", "√",
    ];
    (0..longueur)
        .map(|_| MORCEAUX[rng.pick(MORCEAUX.len() as u32) as usize])
        .collect()
}

fn calc(accurate: bool) -> SmallCalc {
    let mut c = SmallCalc::with_options(CalcOptions {
        accurate,
        standard_constants: true,
        standard_functions: true,
        ..CalcOptions::default()
    });
    let x = c.id_of_variable("x");
    c.set_variable(x, PrimitiveValue::Int(3));
    c
}

fn is_erreur_attendue(kind: ErrorKind) -> bool {
    // Liste blanche : erreurs *normales* pour un fuzz d’expressions bien formées.
    matches!(kind, ErrorKind::DivisionByZero | ErrorKind::InvalidOperation)
}

/* ------------------------ Tests déterministes ------------------------ */

#[test]
fn fuzz_safe_determinisme_et_erreurs_attendues() {
    let t0 = Instant::now();
    let max = Duration::from_millis(400);

    let mut rng = Rng::new(0xC0FFEE_u64);
    let mut seen_ok = 0usize;
    let mut seen_err = 0usize;

    for _ in 0..150 {
        budget(t0, max);

        let expr = gen_expr(&mut rng, 4);
        for accurate in [false, true] {
            let v = calc(accurate).eval(&expr);
            // même entrée, même contexte => même sortie
            assert_eq!(
                v.to_string(),
                calc(accurate).eval(&expr).to_string(),
                "expr={expr:?}"
            );
            match v.error() {
                None => seen_ok += 1,
                Some(kind) => {
                    assert!(
                        is_erreur_attendue(kind),
                        "erreur non attendue: expr={expr:?} err={v}"
                    );
                    seen_err += 1;
                }
            }
        }
    }

    assert!(seen_ok > 20, "trop peu de succès: {seen_ok}");
    assert!(seen_err > 0, "aucune erreur vue: fuzz trop “sage”");
}

#[test]
fn fuzz_safe_exact_proche_du_flottant() {
    let t0 = Instant::now();
    let max = Duration::from_millis(400);

    let mut rng = Rng::new(0xBADC0DE_u64);

    for _ in 0..150 {
        budget(t0, max);

        let expr = gen_expr(&mut rng, 3);
        // round amplifie l’écart flottant autour des moitiés
        if expr.contains("round") {
            continue;
        }
        let exacte = calc(true).eval(&expr);
        let flottante = calc(false).eval(&expr);

        let (Some(a), Some(b)) = (exacte.to_f64(), flottante.to_f64()) else {
            continue;
        };
        if !a.is_finite() || !b.is_finite() {
            continue;
        }
        let echelle = a.abs().max(b.abs()).max(1.0);
        assert!(
            (a - b).abs() <= 1e-9 * echelle,
            "expr={expr:?} exact={exacte} flottant={flottante}"
        );
    }
}

#[test]
fn fuzz_safe_bruit_sans_panique() {
    let t0 = Instant::now();
    let max = Duration::from_millis(300);

    let mut rng = Rng::new(0xFEED_u64);
    let mut c = calc(true);

    for _ in 0..300 {
        budget(t0, max);
        let longueur = rng.pick(14) as usize;
        let texte = gen_bruit(&mut rng, longueur);
        // le résultat importe peu : il doit exister
        let _ = c.eval(&texte);
        if let Some(e) = c.last_expression() {
            let _ = c.print_nice(e);
        }
    }
}

#[test]
fn fuzz_safe_somme_longue_aplatie() {
    let t0 = Instant::now();
    let max = Duration::from_millis(200);

    let expr = vec!["1/2"; 800].join("+");
    let mut c = calc(true);
    let v = c.eval(&expr);
    budget(t0, max);

    // 800*(1/2) = 400, en un seul appel variadique
    assert_eq!(v, PrimitiveValue::Int(400));
}

/* ------------------------ Propriétés ------------------------ */

fn expr_strategy() -> impl Strategy<Value = String> {
    let feuille = (-50i64..50).prop_map(|n| n.to_string());
    feuille.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!["+", "-", "*", "/"]),
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("({l}{op}{r})")),
            inner.clone().prop_map(|e| format!("-({e})")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{l}*{r}")),
            // appels réguliers (√ relu par son symbole)
            (prop::sample::select(vec!["abs", "sqrt", "cos"]), inner.clone())
                .prop_map(|(f, e)| format!("{f}({e})")),
            // affectations imbriquées ; les variables sont écrites, jamais lues
            (prop::sample::select(vec!["a", "b"]), inner)
                .prop_map(|(v, e)| format!("({v}={e})")),
        ]
    })
}

fn memes_valeurs(a: &PrimitiveValue, b: &PrimitiveValue) -> bool {
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) if x.is_nan() && y.is_nan() => true,
        // la relecture peut ré-associer ("2 + (3 + 4)" -> add(2, 3, 4))
        (Some(x), Some(y)) => x == y || (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0),
        _ => a == b,
    }
}

proptest! {
    /// Forme réduite : d > 0 et pgcd(|n|, d) == 1.
    #[test]
    fn normalisation_reduite(n in -1_000_000_000_000i64..1_000_000_000_000, d in -1_000_000i64..1_000_000) {
        prop_assume!(d != 0);
        let f = Fraction64::new(n, d).normalize();
        prop_assert!(f.denominator() > 0);
        prop_assert_eq!(gcd(f.numerator().abs(), f.denominator()), 1);
        // même rationnel
        prop_assert_eq!(i128::from(f.numerator()) * i128::from(d), i128::from(n) * i128::from(f.denominator()));
    }

    /// Dénominateur nul : la fraction invalide désignée.
    #[test]
    fn normalisation_invalide(n in any::<i64>()) {
        prop_assert_eq!(Fraction64::new(n, 0).normalize(), Fraction64::invalid());
    }

    /// Les primitives vérifiées ne paniquent jamais et signalent
    /// exactement les dépassements de l’arithmétique i64.
    #[test]
    fn primitives_verifiees(a in any::<i64>(), b in any::<i64>()) {
        let mut overflow = false;
        let r = add_with_overflow_check(a, b, &mut overflow);
        prop_assert_eq!(a.checked_add(b).is_none(), overflow);
        prop_assert_eq!(r, a.wrapping_add(b));

        let mut overflow = false;
        sub_with_overflow_check(a, b, &mut overflow);
        prop_assert_eq!(a.checked_sub(b).is_none(), overflow);

        let mut overflow = false;
        mult_with_overflow_check(a, b, &mut overflow);
        prop_assert_eq!(a.checked_mul(b).is_none(), overflow);
    }

    /// Mode exact : a/b + c/d vaut la fraction fermée, jamais un flottant.
    #[test]
    fn somme_exacte(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000, d in -1000i64..1000) {
        prop_assume!(b != 0 && d != 0);
        let mut calc = SmallCalc::with_options(CalcOptions { accurate: true, ..CalcOptions::default() });
        let v = calc.eval(&format!("{a}/{b} + {c}/{d}"));
        let attendu = PrimitiveValue::from_fraction(Fraction64::new(a * d + c * b, b * d));
        prop_assert_eq!(v, attendu);
    }

    /// Le dépassement bascule en flottant, jamais en entier enroulé.
    #[test]
    fn produit_depasse_en_flottant(a in 3_037_000_500i64..4_000_000_000, b in 3_037_000_500i64..4_000_000_000) {
        let mut calc = SmallCalc::with_options(CalcOptions { accurate: true, ..CalcOptions::default() });
        let v = calc.eval(&format!("{a}*{b}"));
        prop_assert_eq!(v, PrimitiveValue::Double(a as f64 * b as f64));
    }

    /// Formes affichées (complète et lisible) : re-parsables, même valeur.
    #[test]
    fn aller_retour_affichage(expr in expr_strategy()) {
        let mut calc = SmallCalc::new();
        calc.add_standard_functions();
        let e = calc.parse(&expr);
        prop_assume!(e.error().is_none());
        let v1 = calc.evaluate(&e);
        for affiche in [calc.print_without_optimizations(&e), calc.print_nice(&e)] {
            let relu = calc.parse(&affiche);
            let v2 = calc.evaluate(&relu);
            prop_assert!(memes_valeurs(&v1, &v2), "{} -> {} : {} != {}", expr, affiche, v1, v2);
        }
    }

    /// Aucune entrée ne fait paniquer le pipeline.
    #[test]
    fn eval_sans_panique(s in ".{0,40}") {
        let mut calc = SmallCalc::new();
        calc.add_standard_all();
        let _ = calc.eval(&s);
    }
}
