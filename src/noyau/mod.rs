//! Noyau SmallCalc
//!
//! Organisation interne :
//! - fraction.rs  : fractions i64 + opérations avec détection de débordement
//! - valeur.rs    : PrimitiveValue, erreurs comme valeurs
//! - fonctions.rs : NamedFunction + registre (handles FunctionId)
//! - contexte.rs  : contexte de parse (fonctions, constantes), ids de variables
//! - jetons.rs    : tokenisation (fusion, négations)
//! - rpn.rs       : parser à précédence d’opérateurs
//! - expr.rs      : arbre + évaluation
//! - standard.rs  : opérateurs fondamentaux, fonctions et constantes usuelles
//! - format.rs    : affichage (parenthèses minimales ou complètes)
//! - eval.rs      : façade SmallCalc

pub mod contexte;
pub mod eval;
pub mod expr;
pub mod fonctions;
pub mod format;
pub mod fraction;
pub mod jetons;
pub mod rpn;
pub mod standard;
pub mod valeur;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique minimale
pub use eval::{eval, parse, CalcOptions, Resultat, SmallCalc};
pub use expr::Expression;
pub use valeur::{CalcError, ErrorKind, PrimitiveValue};
