// src/noyau/fraction.rs
//
// Arithmétique exacte sur entiers machine (64 bits par défaut).
// - primitives add/sub/abs/mul avec détection de dépassement
// - pgcd / ppcm
// - Fraction<T> : normalisation + opérations vérifiées
// - to_decimal : lecture décimale tronquée
//
// Contrat dépassement :
// - le drapeau `overflow` est seulement LEVÉ (jamais remis à false)
// - la détection se fait par comparaison aux bornes min/max du type,
//   le résultat renvoyé est la valeur “enroulée” (complément à 2)

use num_traits::{PrimInt, Signed, WrappingAdd, WrappingMul, WrappingNeg, WrappingSub};

use std::fmt;

/// Entier utilisable par le noyau exact.
pub trait Entier:
    PrimInt + Signed + WrappingAdd + WrappingSub + WrappingMul + WrappingNeg + fmt::Display
{
}

impl<T> Entier for T where
    T: PrimInt + Signed + WrappingAdd + WrappingSub + WrappingMul + WrappingNeg + fmt::Display
{
}

/* ------------------------ Primitives vérifiées ------------------------ */

/// Addition avec détection de dépassement.
pub fn add_with_overflow_check<T: Entier>(a: T, b: T, overflow: &mut bool) -> T {
    if b < T::zero() && T::min_value() - b > a {
        *overflow = true;
    }
    if b > T::zero() && T::max_value() - b < a {
        *overflow = true;
    }
    a.wrapping_add(&b)
}

/// Soustraction avec détection de dépassement.
pub fn sub_with_overflow_check<T: Entier>(a: T, b: T, overflow: &mut bool) -> T {
    if b < T::zero() && T::max_value() + b < a {
        *overflow = true;
    }
    if b > T::zero() && T::min_value() + b > a {
        *overflow = true;
    }
    a.wrapping_sub(&b)
}

/// Valeur absolue avec détection de dépassement (|min| n’est pas représentable).
pub fn abs_with_overflow_check<T: Entier>(x: T, overflow: &mut bool) -> T {
    if x == T::min_value() {
        *overflow = true;
    }
    if x < T::zero() {
        x.wrapping_neg()
    } else {
        x
    }
}

/// Multiplication avec détection de dépassement (tests de bornes par signe).
pub fn mult_with_overflow_check<T: Entier>(a: T, b: T, overflow: &mut bool) -> T {
    let zero = T::zero();
    if a > zero {
        if b > zero {
            if a > T::max_value() / b {
                *overflow = true;
            }
        } else if b < T::min_value() / a {
            *overflow = true;
        }
    } else if b > zero {
        if a < T::min_value() / b {
            *overflow = true;
        }
    } else if a != zero && b < T::max_value() / a {
        *overflow = true;
    }
    a.wrapping_mul(&b)
}

/// Plus grand commun diviseur, toujours ≥ 0 sauf pour pgcd(min, 0) / pgcd(min, min)
/// qui ne sont pas représentables (renvoie alors `min`).
pub fn gcd<T: Entier>(a: T, b: T) -> T {
    let moins_un = -T::one();
    let mut a = a;
    let mut b = b;
    while b != T::zero() {
        // min % -1 déborde en Rust : le reste vaut 0 de toute façon
        let r = if b == moins_un { T::zero() } else { a % b };
        a = b;
        b = r;
    }
    if a < T::zero() && a != T::min_value() {
        -a
    } else {
        a
    }
}

/// Plus petit commun multiple : divise par le pgcd AVANT de multiplier.
pub fn lcm_with_overflow_check<T: Entier>(a: T, b: T, overflow: &mut bool) -> T {
    let g = gcd(a, b);
    if g == T::zero() {
        return T::zero();
    }
    mult_with_overflow_check(a / g, b, overflow)
}

/* ------------------------ Fraction ------------------------ */

/// Fraction `numerator / denominator`.
///
/// Après `normalize()` : dénominateur > 0 et pgcd(|n|, d) == 1,
/// ou dénominateur == 0 pour une fraction invalide (division par zéro).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction<T> {
    numerator: T,
    denominator: T,
}

pub type Fraction64 = Fraction<i64>;

impl<T: Entier> Default for Fraction<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T: Entier> From<T> for Fraction<T> {
    fn from(n: T) -> Self {
        Self::new(n, T::one())
    }
}

impl<T: Entier> Fraction<T> {
    /// Fraction brute (non normalisée).
    pub fn new(numerator: T, denominator: T) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// La fraction invalide désignée (0/0).
    pub fn invalid() -> Self {
        Self::new(T::zero(), T::zero())
    }

    pub fn numerator(&self) -> T {
        self.numerator
    }

    pub fn denominator(&self) -> T {
        self.denominator
    }

    pub fn valid(&self) -> bool {
        self.denominator != T::zero()
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == T::one()
    }

    pub fn negation(&self) -> Self {
        Self::new(self.numerator.wrapping_neg(), self.denominator)
    }

    /// Forme réduite (voir invariants de la structure).
    pub fn normalize(&self) -> Self {
        let mut overflow = false;
        self.normalize_with_overflow_check(&mut overflow)
    }

    /// Comme `normalize`, mais signale les formes non représentables
    /// (ex: 1/min dont le signe ne peut pas remonter au numérateur).
    pub fn normalize_with_overflow_check(&self, overflow: &mut bool) -> Self {
        if !self.valid() {
            return Self::invalid();
        }
        // g == min seulement si les deux termes valent min (ou 0 et min) : quotients exacts
        let g = gcd(self.numerator, self.denominator);
        let (n, d) = (self.numerator / g, self.denominator / g);
        if d > T::zero() {
            return Self::new(n, d);
        }
        if n == T::min_value() || d == T::min_value() {
            *overflow = true;
            return Self::invalid();
        }
        Self::new(-n, -d)
    }

    /// Lecture décimale : signe, partie entière, puis au plus `max_valid_length`
    /// chiffres significatifs après la virgule (les zéros de tête ne comptent pas).
    ///
    /// Renvoie `(texte, exact)` ; `exact == false` si un reste non nul a été abandonné
    /// (budget épuisé ou dépassement interne).
    pub fn to_decimal(&self, max_valid_length: usize) -> (String, bool) {
        let current = self.normalize();
        if !current.valid() {
            return ("NaN".to_string(), false);
        }

        let d = current.denominator;
        if d == T::one() {
            return (current.numerator.to_string(), true);
        }

        // d ≥ 2 : |quotient| et |reste| sont représentables
        let mut out = String::new();
        let mut entier = current.numerator / d;
        let mut n = current.numerator % d;
        if current.numerator < T::zero() {
            out.push('-');
            entier = -entier;
            n = -n;
        }
        out.push_str(&entier.to_string());
        if n == T::zero() {
            return (out, true);
        }

        out.push('.');
        let dix = <T as num_traits::NumCast>::from(10).unwrap_or_else(T::one);
        let mut length = 0usize;
        let mut began = false;
        let mut overflow = false;
        while length < max_valid_length && n != T::zero() {
            let suivant = mult_with_overflow_check(n, dix, &mut overflow);
            if overflow {
                break;
            }
            let chiffre = suivant / d;
            out.push_str(&chiffre.to_string());
            n = suivant - chiffre * d;
            if chiffre != T::zero() {
                began = true;
            }
            if began {
                length += 1;
            }
        }

        (out, n == T::zero())
    }
}

impl<T: fmt::Display> fmt::Display for Fraction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/* ------------------------ Opérations vérifiées ------------------------ */

/// Numérateurs ramenés au dénominateur commun (ppcm via le pgcd) : (na, nb, ppcm).
fn same_denominator<T: Entier>(
    a: &Fraction<T>,
    b: &Fraction<T>,
    overflow: &mut bool,
) -> (T, T, T) {
    let g = gcd(a.denominator, b.denominator);
    if g == T::zero() {
        return (T::zero(), T::zero(), T::zero());
    }
    let am = b.denominator / g;
    let bm = a.denominator / g;

    let an = mult_with_overflow_check(a.numerator, am, overflow);
    let bn = mult_with_overflow_check(b.numerator, bm, overflow);
    let lcm = mult_with_overflow_check(a.denominator / g, b.denominator, overflow);
    (an, bn, lcm)
}

pub fn add_fractions<T: Entier>(a: &Fraction<T>, b: &Fraction<T>, overflow: &mut bool) -> Fraction<T> {
    let (an, bn, lcm) = same_denominator(a, b, overflow);
    let n = add_with_overflow_check(an, bn, overflow);
    Fraction::new(n, lcm).normalize_with_overflow_check(overflow)
}

pub fn sub_fractions<T: Entier>(a: &Fraction<T>, b: &Fraction<T>, overflow: &mut bool) -> Fraction<T> {
    let (an, bn, lcm) = same_denominator(a, b, overflow);
    let n = sub_with_overflow_check(an, bn, overflow);
    Fraction::new(n, lcm).normalize_with_overflow_check(overflow)
}

pub fn mult_fractions<T: Entier>(a: &Fraction<T>, b: &Fraction<T>, overflow: &mut bool) -> Fraction<T> {
    let n = mult_with_overflow_check(a.numerator, b.numerator, overflow);
    let d = mult_with_overflow_check(a.denominator, b.denominator, overflow);
    Fraction::new(n, d).normalize_with_overflow_check(overflow)
}

/// Division : un diviseur nul donne la fraction invalide (pas de dépassement).
pub fn div_fractions<T: Entier>(a: &Fraction<T>, b: &Fraction<T>, overflow: &mut bool) -> Fraction<T> {
    let n = mult_with_overflow_check(a.numerator, b.denominator, overflow);
    let d = mult_with_overflow_check(b.numerator, a.denominator, overflow);
    Fraction::new(n, d).normalize_with_overflow_check(overflow)
}
