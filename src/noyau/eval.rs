//! Noyau : façade (pipeline réel)
//!
//! texte -> jetons -> parser (précédence) -> Expression -> évaluation
//!
//! `SmallCalc` garde ensemble : registre + constantes, allocateur de variables,
//! contexte d’évaluation, dernier arbre. Non partageable entre threads
//! sans synchronisation externe (un contexte = un appelant).

use log::debug;

use super::contexte::{ParserContext, VariableId, VariableIdMapping};
use super::expr::{EvaluationContext, Expression};
use super::fonctions::{FunctionId, FunctionRegistry, NamedFunction};
use super::format::{print_nice, print_without_optimizations};
use super::jetons::{format_tokens, tokenize};
use super::rpn::Parser;
use super::standard;
use super::valeur::PrimitiveValue;

/// Réglages de la façade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalcOptions {
    /// arithmétique exacte (entiers / fractions) avec repli flottant
    pub accurate: bool,
    pub standard_constants: bool,
    pub standard_functions: bool,
    /// chiffres significatifs de la lecture décimale d’une fraction
    pub decimal_digits: usize,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            accurate: false,
            standard_constants: false,
            standard_functions: false,
            decimal_digits: 8,
        }
    }
}

/// Lecture décimale d’une fraction : `= 0.25` ou `=~ 0.33333333...`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lecture {
    pub texte: String,
    pub exacte: bool,
}

impl std::fmt::Display for Lecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exacte {
            write!(f, "= {}", self.texte)
        } else {
            write!(f, "=~ {}...", self.texte)
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct Demarche {
    pub jetons: String,
    /// forme entièrement parenthésée
    pub canonique: String,
    pub joli: String,
}

/// Résultat détaillé d’une évaluation (pour l’hôte).
#[derive(Clone, Debug)]
pub struct Resultat {
    pub valeur: PrimitiveValue,
    pub exact: String,
    /// None si la valeur n’est pas une fraction
    pub lecture: Option<Lecture>,
    pub demarche: Demarche,
}

pub struct SmallCalc {
    context: ParserContext,
    variables: VariableIdMapping,
    evaluation: EvaluationContext,
    last: Option<Expression>,
    decimal_digits: usize,
}

impl Default for SmallCalc {
    fn default() -> Self {
        Self::new()
    }
}

impl SmallCalc {
    /// Opérateurs fondamentaux seulement, mode flottant.
    pub fn new() -> Self {
        Self::with_options(CalcOptions::default())
    }

    pub fn with_options(options: CalcOptions) -> Self {
        let mut calc = Self {
            context: ParserContext::new(),
            variables: VariableIdMapping::new(),
            evaluation: EvaluationContext::new(),
            last: None,
            decimal_digits: options.decimal_digits,
        };
        calc.set_accurate_level(options.accurate);
        if options.standard_constants {
            calc.add_standard_constants();
        }
        if options.standard_functions {
            calc.add_standard_functions();
        }
        calc
    }

    /* ---- enregistrements ---- */

    /// π (PI, pi) et e (E).
    pub fn add_standard_constants(&mut self) {
        standard::register_standard_constants(&mut self.context);
    }

    /// sin, cos, tan, round, sqrt (√), acos, asin, atan, cosh, sinh, tanh,
    /// acosh, asinh, atanh, ln, abs.
    pub fn add_standard_functions(&mut self) {
        standard::register_standard_functions(&mut self.context);
    }

    pub fn add_standard_all(&mut self) {
        self.add_standard_constants();
        self.add_standard_functions();
    }

    pub fn add_constant(&mut self, name: &str, value: PrimitiveValue, aliases: &[&str]) {
        self.context.add_constant(name, value, aliases);
    }

    pub fn add_function(&mut self, function: NamedFunction) -> FunctionId {
        self.context.add_function(function)
    }

    /// Accès direct au contexte de parse.
    pub fn parser_context_mut(&mut self) -> &mut ParserContext {
        &mut self.context
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.context.functions()
    }

    /* ---- réglages ---- */

    pub fn set_accurate_level(&mut self, accurate: bool) {
        debug!("mode exact : {accurate}");
        self.evaluation.set_accurate(accurate);
    }

    pub fn accurate_level(&self) -> bool {
        self.evaluation.accurate()
    }

    pub fn set_decimal_digits(&mut self, digits: usize) {
        self.decimal_digits = digits;
    }

    /* ---- variables ---- */

    pub fn id_of_variable(&mut self, name: &str) -> VariableId {
        self.variables.id_of(name)
    }

    pub fn set_variable(&mut self, id: VariableId, value: PrimitiveValue) {
        self.evaluation.set_variable(id, value);
    }

    pub fn variable(&self, id: VariableId) -> Option<&PrimitiveValue> {
        self.evaluation.variable(id)
    }

    /// L’identifiant reste alloué ; seule la valeur est oubliée.
    pub fn unset_variable(&mut self, id: VariableId) {
        debug!("variable {id} oubliée");
        self.evaluation.unset_variable(id);
    }

    /// Variables rencontrées (parse ou hôte), liées ou non, par id croissant.
    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &str, Option<&PrimitiveValue>)> {
        self.variables
            .iter()
            .map(move |(id, name)| (id, name, self.evaluation.variable(id)))
    }

    /* ---- pipeline ---- */

    /// Jamais d’échec : une erreur devient un littéral d’erreur.
    pub fn parse(&mut self, input: &str) -> Expression {
        match tokenize(input) {
            Ok(tokens) => Parser::new(&self.context, &mut self.variables).parse(tokens),
            Err(e) => Expression::from(e),
        }
    }

    /// Évalue un arbre construit avec ce registre.
    pub fn evaluate(&mut self, expression: &Expression) -> PrimitiveValue {
        expression.eval(self.context.functions(), &mut self.evaluation)
    }

    /// Parse + évaluation ; l’arbre est gardé (`last_expression`).
    pub fn eval(&mut self, input: &str) -> PrimitiveValue {
        let e = self.parse(input);
        let v = self.evaluate(&e);
        self.last = Some(e);
        v
    }

    pub fn last_expression(&self) -> Option<&Expression> {
        self.last.as_ref()
    }

    pub fn print_nice(&self, expression: &Expression) -> String {
        print_nice(expression, self.context.functions())
    }

    pub fn print_without_optimizations(&self, expression: &Expression) -> String {
        print_without_optimizations(expression, self.context.functions())
    }

    /// Évaluation + démarche (jetons, formes affichées) + lecture décimale.
    pub fn eval_detaille(&mut self, input: &str) -> Resultat {
        let jetons = tokenize(input)
            .map(|t| format_tokens(&t))
            .unwrap_or_default();

        let valeur = self.eval(input);
        let (canonique, joli) = match &self.last {
            Some(e) => (self.print_without_optimizations(e), self.print_nice(e)),
            None => (String::new(), String::new()),
        };

        let lecture = match &valeur {
            PrimitiveValue::Fraction(f) => {
                let (texte, exacte) = f.to_decimal(self.decimal_digits);
                Some(Lecture { texte, exacte })
            }
            _ => None,
        };

        Resultat {
            exact: valeur.to_string(),
            valeur,
            lecture,
            demarche: Demarche {
                jetons,
                canonique,
                joli,
            },
        }
    }
}

/// Parse avec une façade neuve (opérateurs fondamentaux seulement).
pub fn parse(input: &str) -> Expression {
    SmallCalc::new().parse(input)
}

/// Évalue avec une façade neuve (mode flottant).
pub fn eval(input: &str) -> PrimitiveValue {
    SmallCalc::new().eval(input)
}
