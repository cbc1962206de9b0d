// src/noyau/fonctions.rs
//
// Descripteurs de fonctions nommées + registre (arène indexée par FunctionId).
// Les arbres référencent les fonctions par identifiant : un descripteur est
// partagé par tous les arbres construits avec le même registre.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use super::expr::{EvaluationContext, Expression};
use super::valeur::{CalcError, ErrorKind, PrimitiveValue};

/// Rappel d’évaluation : arguments déjà évalués (gauche -> droite) + contexte.
pub type EvalFn = Box<dyn Fn(&[PrimitiveValue], &EvaluationContext) -> PrimitiveValue>;

/// Construction d’arbre personnalisée (ex: `=` produit un nœud Assignment).
pub type TreeBuilderFn = Box<dyn Fn(FunctionId, Vec<Expression>) -> Result<Expression, CalcError>>;

/// Handle vers un descripteur du registre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    /// Encodage historique : n ≥ 0 fixe, n < 0 “au moins -n-1”.
    pub fn from_encoded(n: i32) -> Self {
        if n >= 0 {
            Arity::Exact(n as usize)
        } else {
            Arity::AtLeast((-(n as i64) - 1) as usize)
        }
    }

    pub fn encoded(self) -> i32 {
        match self {
            Arity::Exact(n) => n as i32,
            Arity::AtLeast(k) => -(k as i32) - 1,
        }
    }

    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(m) => n == m,
            Arity::AtLeast(k) => n >= k,
        }
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, Arity::AtLeast(_))
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoded())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notation {
    Regular,
    Infix,
    Prefix,
    Postfix,
}

/// Descripteur immuable une fois enregistré.
pub struct NamedFunction {
    name: String,
    printing_name: Option<String>,
    arity: Arity,
    notation: Notation,
    precedence: i32,
    associative: bool,
    eval: Option<EvalFn>,
    tree_builder: Option<TreeBuilderFn>,
}

impl NamedFunction {
    /// Fonction régulière unaire, sans rappel ; compléter avec les `with_*`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            printing_name: None,
            arity: Arity::Exact(1),
            notation: Notation::Regular,
            precedence: 0,
            associative: false,
            eval: None,
            tree_builder: None,
        }
    }

    pub fn with_printing_name(mut self, symbol: impl Into<String>) -> Self {
        self.printing_name = Some(symbol.into());
        self
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_notation(mut self, notation: Notation) -> Self {
        self.notation = notation;
        self
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_associative(mut self, associative: bool) -> Self {
        self.associative = associative;
        self
    }

    pub fn with_eval<F>(mut self, f: F) -> Self
    where
        F: Fn(&[PrimitiveValue], &EvaluationContext) -> PrimitiveValue + 'static,
    {
        self.eval = Some(Box::new(f));
        self
    }

    pub fn with_tree_builder<F>(mut self, f: F) -> Self
    where
        F: Fn(FunctionId, Vec<Expression>) -> Result<Expression, CalcError> + 'static,
    {
        self.tree_builder = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn printing_name(&self) -> Option<&str> {
        self.printing_name.as_deref()
    }

    /// Nom d’affichage : symbole s’il existe, sinon le nom.
    pub fn favoured_name(&self) -> &str {
        self.printing_name.as_deref().unwrap_or(&self.name)
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn precedence(&self) -> i32 {
        self.precedence
    }

    pub fn is_associative(&self) -> bool {
        self.associative
    }

    pub fn has_eval(&self) -> bool {
        self.eval.is_some()
    }

    /// Appelle le rappel ; sans rappel -> NotSupported.
    pub fn call(&self, args: &[PrimitiveValue], ctx: &EvaluationContext) -> PrimitiveValue {
        match &self.eval {
            Some(f) => f(args, ctx),
            None => PrimitiveValue::error_value(
                ErrorKind::NotSupported,
                format!("{} cannot be evaluated", self.name),
            ),
        }
    }

    /// Nœud d’appel (ou nœud personnalisé si un constructeur est fourni).
    pub fn build(&self, id: FunctionId, arguments: Vec<Expression>) -> Result<Expression, CalcError> {
        match &self.tree_builder {
            Some(f) => f(id, arguments),
            None => Ok(Expression::FunctionCall {
                function: id,
                arguments,
            }),
        }
    }
}

impl fmt::Debug for NamedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFunction")
            .field("name", &self.name)
            .field("printing_name", &self.printing_name)
            .field("arity", &self.arity)
            .field("notation", &self.notation)
            .field("precedence", &self.precedence)
            .field("associative", &self.associative)
            .field("eval", &self.eval.is_some())
            .field("tree_builder", &self.tree_builder.is_some())
            .finish()
    }
}

/* ------------------------ Registre ------------------------ */

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: Vec<NamedFunction>,
    by_name: HashMap<String, FunctionId>,
    // symboles des fonctions non préfixes (+, *, √, ...)
    non_prefix: HashMap<String, FunctionId>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un descripteur ; un nom déjà pris est remplacé en gardant son id.
    pub fn register(&mut self, function: NamedFunction) -> FunctionId {
        let id = match self.by_name.get(function.name()) {
            Some(&id) => {
                warn!("fonction {} remplacée", function.name());
                id
            }
            None => FunctionId(self.functions.len()),
        };

        debug!(
            "enregistrement {} (arité {}, {:?}, précédence {})",
            function.name(),
            function.arity(),
            function.notation(),
            function.precedence()
        );

        self.by_name.insert(function.name().to_string(), id);
        if function.notation() != Notation::Prefix {
            if let Some(symbol) = function.printing_name() {
                self.non_prefix.insert(symbol.to_string(), id);
            }
        }

        if id.0 == self.functions.len() {
            self.functions.push(function);
        } else {
            self.functions[id.0] = function;
        }
        id
    }

    pub fn get(&self, id: FunctionId) -> Option<&NamedFunction> {
        self.functions.get(id.0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied()
    }

    /// Recherche d’un opérateur par symbole (fonctions non préfixes).
    pub fn find_by_symbol(&self, symbol: &str) -> Option<FunctionId> {
        self.non_prefix.get(symbol).copied()
    }

    /// Nom de fonction écrit devant `(` : par nom, puis par symbole.
    pub fn find_regular(&self, text: &str) -> Option<FunctionId> {
        self.find_by_name(text).or_else(|| self.find_by_symbol(text))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FunctionId, &NamedFunction)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i), f))
    }
}
