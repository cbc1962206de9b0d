// src/lib.rs
//
// SmallCalc : évaluateur d’expressions (fractions exactes, repli flottant).
// Le binaire (feature `app`) n’est qu’une interface autour de `noyau`.

pub mod noyau;

pub use noyau::{eval, parse, CalcError, CalcOptions, ErrorKind, Expression, PrimitiveValue, SmallCalc};
