// src/noyau/format.rs
//
// Affichage d’un arbre selon la notation de chaque fonction.
// La précédence courante est passée en paramètre (sauvée/restaurée à chaque
// descente), jamais stockée globalement.

use super::expr::Expression;
use super::fonctions::{FunctionId, FunctionRegistry, NamedFunction, Notation};

#[derive(Clone, Copy, Debug)]
pub struct PrintingContext {
    /// false : parenthèses partout (forme canonique, re-parsable telle quelle)
    pub precedence_optimization: bool,
    current_precedence: i32,
    // opérateur englobant (aplatissement "2 + (3 + 4)")
    current_function: Option<FunctionId>,
}

impl Default for PrintingContext {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PrintingContext {
    pub fn new(precedence_optimization: bool) -> Self {
        Self {
            precedence_optimization,
            current_precedence: 0,
            current_function: None,
        }
    }

    pub fn current_precedence(&self) -> i32 {
        self.current_precedence
    }

    /// Exécute `f` sous la précédence `p`, puis restaure l’ancienne.
    pub fn with_precedence<R>(&mut self, p: i32, f: impl FnOnce(&mut Self) -> R) -> R {
        self.with_operator(p, None, f)
    }

    fn with_operator<R>(
        &mut self,
        p: i32,
        function: Option<FunctionId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = (self.current_precedence, self.current_function);
        self.current_precedence = p;
        self.current_function = function;
        let r = f(self);
        (self.current_precedence, self.current_function) = saved;
        r
    }

    /// Parenthèses superflues autour de l’opérateur `id` ?
    /// À précédence égale, seulement sous le même opérateur associatif.
    fn can_skip(&self, id: FunctionId, f: &NamedFunction) -> bool {
        self.precedence_optimization
            && (f.precedence() > self.current_precedence
                || (f.precedence() == self.current_precedence
                    && f.is_associative()
                    && self.current_function == Some(id)))
    }
}

/// Forme lisible (parenthèses minimales).
pub fn print_nice(e: &Expression, functions: &FunctionRegistry) -> String {
    print(e, functions, &mut PrintingContext::new(true))
}

/// Forme entièrement parenthésée.
pub fn print_without_optimizations(e: &Expression, functions: &FunctionRegistry) -> String {
    print(e, functions, &mut PrintingContext::new(false))
}

pub fn print(e: &Expression, functions: &FunctionRegistry, pc: &mut PrintingContext) -> String {
    match e {
        Expression::Literal(v) => v.to_string(),
        Expression::Variable { name, .. } | Expression::Constant { name, .. } => name.clone(),

        Expression::Assignment { target, value } => {
            // imbriquée ("2*(x=3)") : parenthèses obligatoires à la relecture
            let skip = pc.precedence_optimization && pc.current_precedence() <= 0;
            let precedence = functions
                .find_by_name("assignment")
                .and_then(|id| functions.get(id))
                .map_or(1, NamedFunction::precedence);
            let body = pc.with_precedence(precedence, |pc| {
                let t = print(target, functions, pc);
                let v = print(value, functions, pc);
                format!("{t} = {v}")
            });
            wrap(body, skip)
        }

        Expression::FunctionCall {
            function,
            arguments,
        } => match functions.get(*function) {
            Some(f) => print_call(*function, f, arguments, functions, pc),
            None => "<?>".to_string(),
        },
    }
}

fn print_call(
    id: FunctionId,
    f: &NamedFunction,
    arguments: &[Expression],
    functions: &FunctionRegistry,
    pc: &mut PrintingContext,
) -> String {
    let symbol = f.favoured_name();

    match (f.notation(), arguments) {
        (Notation::Infix, [_, _, ..]) => {
            let skip = pc.can_skip(id, f);
            let body = pc.with_operator(f.precedence(), Some(id), |pc| {
                arguments
                    .iter()
                    .map(|a| print(a, functions, pc))
                    .collect::<Vec<_>>()
                    .join(&format!(" {symbol} "))
            });
            wrap(body, skip)
        }

        (Notation::Prefix, [a]) => {
            let skip = pc.can_skip(id, f);
            let body = pc.with_operator(f.precedence(), Some(id), |pc| print(a, functions, pc));
            wrap(format!("{symbol}{body}"), skip)
        }

        // Regular, postfixe (le parser ne lit pas de postfixe), ou opérateur
        // avec un nombre d’arguments inhabituel : l’opérateur s’écrit alors
        // par son nom ("add(2)", "fact(3)"), re-parsable
        _ => {
            let symbol = match f.notation() {
                Notation::Regular => symbol,
                _ => f.name(),
            };
            let args = pc.with_precedence(0, |pc| {
                arguments
                    .iter()
                    .map(|a| print(a, functions, pc))
                    .collect::<Vec<_>>()
                    .join(",")
            });
            format!("{symbol}({args})")
        }
    }
}

fn wrap(s: String, skip: bool) -> String {
    if skip {
        s
    } else {
        format!("({s})")
    }
}
