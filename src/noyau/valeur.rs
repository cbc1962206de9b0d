// src/noyau/valeur.rs
//
// Valeurs primitives manipulées par l’évaluateur + erreurs en valeurs.

use std::fmt;

use thiserror::Error;

use super::fraction::Fraction64;

/// Catégorie d’erreur (parse ou évaluation).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("NotSupported")]
    NotSupported,
    #[error("Parser.ParenthesisMismatch")]
    ParenthesisMismatch,
    #[error("Parser.NoValidToken")]
    NoValidToken,
    #[error("Parser.NoTokens")]
    NoTokens,
    #[error("Parser.WrongArgumentCount")]
    WrongArgumentCount,
    #[error("Parser.UnknownFunction")]
    UnknownFunction,
    #[error("Eval.BadType")]
    BadType,
    #[error("Eval.InvalidOperation")]
    InvalidOperation,
    #[error("Eval.UnboundVariable")]
    UnboundVariable,
    #[error("Eval.DivisionByZero")]
    DivisionByZero,
}

/// Erreur complète : catégorie, message, position du jeton fautif (si connue).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CalcError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<usize>,
}

impl CalcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            position: Some(position),
        }
    }
}

/// Valeur primitive.
///
/// Les erreurs sont des valeurs : aucune opération du noyau ne panique,
/// l’appelant teste `value.error()`.
#[derive(Clone, Debug, Default)]
pub enum PrimitiveValue {
    #[default]
    Null,
    Double(f64),
    Int(i64),
    Fraction(Fraction64),
    Error(CalcError),
}

impl PrimitiveValue {
    pub fn error_value(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error(CalcError::new(kind, message))
    }

    /// Fraction normalisée ; dénominateur 1 -> Int, fraction invalide -> DivisionByZero.
    pub fn from_fraction(f: Fraction64) -> Self {
        let f = f.normalize();
        if !f.valid() {
            return Self::error_value(ErrorKind::DivisionByZero, "Division by zero");
        }
        if f.is_integer() {
            return Self::Int(f.numerator());
        }
        Self::Fraction(f)
    }

    /// `None` = pas d’erreur.
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&CalcError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Genre “exact” : entier, fraction ou erreur.
    pub fn is_accurate(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Fraction(_) | Self::Error(_))
    }

    /// Vue fraction des valeurs exactes (entier -> n/1).
    pub fn as_fraction(&self) -> Option<Fraction64> {
        match self {
            Self::Int(n) => Some(Fraction64::from(*n)),
            Self::Fraction(f) => Some(*f),
            _ => None,
        }
    }

    /// Vue flottante des valeurs numériques.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Double(x) => Some(*x),
            Self::Int(n) => Some(*n as f64),
            Self::Fraction(f) => Some(f.numerator() as f64 / f.denominator() as f64),
            Self::Null | Self::Error(_) => None,
        }
    }
}

impl PartialEq for PrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Fraction(a), Self::Fraction(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a.kind == b.kind,
            _ => false,
        }
    }
}

impl From<i64> for PrimitiveValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(x: f64) -> Self {
        Self::Double(x)
    }
}

impl From<Fraction64> for PrimitiveValue {
    fn from(f: Fraction64) -> Self {
        Self::from_fraction(f)
    }
}

impl From<CalcError> for PrimitiveValue {
    fn from(e: CalcError) -> Self {
        Self::Error(e)
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Double(x) => write!(f, "{x}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Fraction(q) => write!(f, "{q}"),
            Self::Error(e) => write!(f, "Err: {} {}", e.kind, e.message),
        }
    }
}
