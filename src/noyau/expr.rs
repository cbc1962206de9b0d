// src/noyau/expr.rs
//
// Arbre d’expression + évaluation.
// - Literal    : valeur (y compris une erreur de parse)
// - Variable   : lue dans le contexte d’évaluation
// - Constant   : valeur figée au parse, jamais lue dans le contexte
// - FunctionCall : handle de fonction + enfants ordonnés
// - Assignment : cible (doit être une Variable, vérifié à l’évaluation) + valeur
//
// L’arbre est immuable après le parse.

use super::contexte::VariableId;
use super::fonctions::{FunctionId, FunctionRegistry};
use super::valeur::{CalcError, ErrorKind, PrimitiveValue};

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Literal(PrimitiveValue),
    Variable {
        name: String,
        id: VariableId,
    },
    Constant {
        name: String,
        value: PrimitiveValue,
    },
    FunctionCall {
        function: FunctionId,
        arguments: Vec<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
    },
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Literal(PrimitiveValue::Null)
    }
}

impl From<CalcError> for Expression {
    fn from(e: CalcError) -> Self {
        Expression::Literal(PrimitiveValue::Error(e))
    }
}

impl Expression {
    /// Catégorie d’erreur si la racine est un littéral d’erreur (échec du parse).
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Expression::Literal(v) => v.error(),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&CalcError> {
        match self {
            Expression::Literal(v) => v.as_error(),
            _ => None,
        }
    }

    /// Évaluation récursive ; seule une affectation modifie `ctx`.
    pub fn eval(&self, functions: &FunctionRegistry, ctx: &mut EvaluationContext) -> PrimitiveValue {
        match self {
            Expression::Literal(v) => v.clone(),

            Expression::Constant { value, .. } => value.clone(),

            Expression::Variable { name, id } => match ctx.variable(*id) {
                Some(v) => v.clone(),
                None => PrimitiveValue::error_value(
                    ErrorKind::UnboundVariable,
                    format!("Variable {name} is not bound"),
                ),
            },

            Expression::FunctionCall {
                function,
                arguments,
            } => {
                let Some(f) = functions.get(*function) else {
                    return PrimitiveValue::error_value(
                        ErrorKind::InvalidOperation,
                        "Unknown function handle",
                    );
                };

                // gauche -> droite, arrêt à la première erreur
                let mut values = Vec::with_capacity(arguments.len());
                for a in arguments {
                    let v = a.eval(functions, ctx);
                    if v.error().is_some() {
                        return v;
                    }
                    values.push(v);
                }
                f.call(&values, ctx)
            }

            Expression::Assignment { target, value } => {
                let Expression::Variable { id, .. } = target.as_ref() else {
                    return PrimitiveValue::error_value(
                        ErrorKind::BadType,
                        "Variable expected on left side",
                    );
                };
                let v = value.eval(functions, ctx);
                if v.error().is_some() {
                    return v;
                }
                ctx.set_variable(*id, v.clone());
                v
            }
        }
    }
}

/* ------------------------ Contexte d’évaluation ------------------------ */

/// Variables liées (indexées par id) + drapeau du mode exact.
#[derive(Clone, Debug, Default)]
pub struct EvaluationContext {
    variables: Vec<Option<PrimitiveValue>>,
    accurate: bool,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accurate(&self) -> bool {
        self.accurate
    }

    pub fn set_accurate(&mut self, accurate: bool) {
        self.accurate = accurate;
    }

    pub fn variable(&self, id: VariableId) -> Option<&PrimitiveValue> {
        self.variables.get(id).and_then(Option::as_ref)
    }

    pub fn set_variable(&mut self, id: VariableId, value: PrimitiveValue) {
        if id >= self.variables.len() {
            self.variables.resize(id + 1, None);
        }
        self.variables[id] = Some(value);
    }

    pub fn unset_variable(&mut self, id: VariableId) {
        if let Some(slot) = self.variables.get_mut(id) {
            *slot = None;
        }
    }
}
