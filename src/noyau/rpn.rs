// src/noyau/rpn.rs
//
// Parser à précédence d’opérateurs (shunting-yard modifié).
//
// Un état = jetons en ordre postfixé + pile d’opérateurs + début (position)
// + drapeau “liste d’arguments de fonction”.
// - '('   : empile l’état courant ; après un nom de fonction, un état fonction
//           (qui garde le jeton de la fonction) est empilé en plus
// - ','   : seulement dans une liste d’arguments ; réduit l’argument courant
// - ')'   : réduit, dépile, réinjecte le sous-arbre (jeton Expression) ;
//           applique la fonction si l’état dépilé est un état fonction
// - nombre suivi d’un identifiant ou de '(' : '*' implicite
// - opérateur : dépile (vers le postfixé) tout opérateur de précédence ≥
//
// Réduction (compress) : lecture du postfixé, pile d’arguments ; un opérateur
// associatif variadique absorbe l’opérande droit dans un appel identique
// déjà construit à sa gauche (2+3+4 -> add(2,3,4)).

use log::debug;

use super::contexte::{ParserContext, VariableIdMapping};
use super::expr::Expression;
use super::fonctions::{FunctionId, NamedFunction, Notation};
use super::jetons::{Tok, Token};
use super::valeur::{CalcError, ErrorKind, PrimitiveValue};

#[derive(Debug, Default)]
struct State {
    is_function: bool,
    begin: usize,
    tokens: Vec<Token>,
    commands: Vec<Token>,
}

/// Parser à usage unique : `parse` le consomme.
pub struct Parser<'a> {
    context: &'a ParserContext,
    variables: &'a mut VariableIdMapping,
    current: State,
    stack: Vec<State>,
}

impl<'a> Parser<'a> {
    pub fn new(context: &'a ParserContext, variables: &'a mut VariableIdMapping) -> Self {
        Self {
            context,
            variables,
            current: State::default(),
            stack: Vec::new(),
        }
    }

    /// Construit l’arbre ; un échec devient un littéral d’erreur (avec position).
    pub fn parse(mut self, tokens: Vec<Token>) -> Expression {
        debug!("parse de {} jetons", tokens.len());
        match self.run(tokens) {
            Ok(e) => e,
            Err(err) => {
                debug!("erreur de parse à {:?} : {err}", err.position);
                Expression::from(err)
            }
        }
    }

    fn run(&mut self, tokens: Vec<Token>) -> Result<Expression, CalcError> {
        if tokens.is_empty() {
            return Err(CalcError::at(ErrorKind::NoTokens, "No input", 0));
        }

        let mut await_function: Option<Token> = None;
        let mut iter = tokens.into_iter().peekable();

        while let Some(ct) = iter.next() {
            let next = iter.peek().map(|t| &t.tok);
            let next_is_lp = matches!(next, Some(Tok::Lp));
            let next_opens_operand = matches!(next, Some(Tok::Lp | Tok::Ident(_)));

            if ct.tok == Tok::Lp {
                self.open(ct.position, await_function.take());
                continue;
            }
            if let Some(f) = &await_function {
                return Err(CalcError::at(
                    ErrorKind::NoValidToken,
                    format!("Awaited function arguments for {}", f.text),
                    ct.position,
                ));
            }

            match ct.tok {
                Tok::Comma => self.comma(ct.position)?,
                Tok::Rp => self.close(ct.position)?,
                Tok::Ident(_) if next_is_lp => {
                    if self.context.functions().find_regular(&ct.text).is_none() {
                        return Err(CalcError::at(
                            ErrorKind::UnknownFunction,
                            format!("Unknown function {}", ct.text),
                            ct.position,
                        ));
                    }
                    await_function = Some(ct);
                }
                Tok::Int(_) | Tok::Double(_) if next_opens_operand => {
                    let position = ct.position;
                    self.current.tokens.push(ct);
                    self.insert_command(Token::classify("*", position))?;
                }
                Tok::Int(_) | Tok::Double(_) | Tok::Ident(_) | Tok::Expression(_) => {
                    self.current.tokens.push(ct)
                }
                _ if self.find_non_regular(&ct).is_some() => self.insert_command(ct)?,
                _ => {
                    return Err(CalcError::at(
                        ErrorKind::NotSupported,
                        format!("Unsupported Token: {}", ct.text),
                        ct.position,
                    ))
                }
            }
        }

        if !self.stack.is_empty() {
            return Err(CalcError::at(
                ErrorKind::ParenthesisMismatch,
                "Missing closing parenthesis",
                self.current.begin,
            ));
        }
        self.finalize();
        self.compress()
    }

    /* ------------------------ Parenthèses / virgules ------------------------ */

    fn open(&mut self, position: usize, function: Option<Token>) {
        let englobant = std::mem::take(&mut self.current);
        self.stack.push(englobant);
        self.current.begin = position;

        if let Some(f) = function {
            self.current.is_function = true;
            self.current.commands.push(f);
            let etat_fonction = std::mem::take(&mut self.current);
            self.stack.push(etat_fonction);
            self.current.begin = position;
        }
    }

    fn comma(&mut self, position: usize) -> Result<(), CalcError> {
        if !self.stack.last().is_some_and(|s| s.is_function) {
            return Err(CalcError::at(
                ErrorKind::NoValidToken,
                "Unexpected comma",
                position,
            ));
        }
        self.finalize();
        let argument = self.compress()?;
        let begin = self.current.begin;
        self.current = State {
            begin: position,
            ..State::default()
        };
        if let Some(fonction) = self.stack.last_mut() {
            fonction.tokens.push(Token::expression(argument, begin));
        }
        Ok(())
    }

    fn close(&mut self, position: usize) -> Result<(), CalcError> {
        let Some(englobant) = self.stack.last() else {
            return Err(CalcError::at(
                ErrorKind::ParenthesisMismatch,
                "Too much closing parenthesis",
                position,
            ));
        };
        // f() : liste d’arguments vide autorisée
        let vide_permis = englobant.is_function;

        self.finalize();
        let sous_arbre = if self.current.tokens.is_empty() && vide_permis {
            None
        } else {
            Some(self.compress()?)
        };
        let begin = self.current.begin;

        self.current = self.pop_state(position)?;
        if let Some(e) = sous_arbre {
            self.current.tokens.push(Token::expression(e, begin));
        }

        if self.current.is_function {
            let appel = self.compress_function()?;
            let debut_fonction = self.current.begin;
            self.current = self.pop_state(position)?;
            self.current
                .tokens
                .push(Token::expression(appel, debut_fonction));
        }
        Ok(())
    }

    fn pop_state(&mut self, position: usize) -> Result<State, CalcError> {
        self.stack.pop().ok_or_else(|| {
            CalcError::at(
                ErrorKind::ParenthesisMismatch,
                "Too much closing parenthesis",
                position,
            )
        })
    }

    /* ------------------------ Opérateurs ------------------------ */

    /// Opérateur désigné par un jeton (négation, ou symbole non préfixe).
    fn find_non_regular(&self, t: &Token) -> Option<FunctionId> {
        let functions = self.context.functions();
        match t.tok {
            Tok::Negate => functions.find_by_name("negate"),
            Tok::Plus | Tok::Minus | Tok::Asterisk | Tok::Slash | Tok::Circumflex | Tok::Equals => {
                functions.find_by_symbol(&t.text)
            }
            _ => None,
        }
    }

    fn function_of(&self, t: &Token) -> Option<(FunctionId, &'a NamedFunction)> {
        let context: &'a ParserContext = self.context;
        let id = self.find_non_regular(t)?;
        Some((id, context.functions().get(id)?))
    }

    fn insert_command(&mut self, token: Token) -> Result<(), CalcError> {
        let Some((_, f)) = self.function_of(&token) else {
            return Err(CalcError::at(
                ErrorKind::NotSupported,
                format!("Unsupported Token: {}", token.text),
                token.position,
            ));
        };

        // tout opérateur, préfixe compris, dépile les précédences ≥ ("--x" : erreur)
        let precedence = f.precedence();
        while let Some(top) = self.current.commands.last() {
            let p = self
                .function_of(top)
                .map_or(i32::MIN, |(_, g)| g.precedence());
            if p < precedence {
                break;
            }
            if let Some(t) = self.current.commands.pop() {
                self.current.tokens.push(t);
            }
        }
        self.current.commands.push(token);
        Ok(())
    }

    /// Vide la pile d’opérateurs dans le postfixé.
    fn finalize(&mut self) {
        while let Some(t) = self.current.commands.pop() {
            self.current.tokens.push(t);
        }
    }

    /* ------------------------ Réduction ------------------------ */

    fn convert_argument(&mut self, t: Token) -> Result<Expression, CalcError> {
        match t.tok {
            Tok::Int(n) => Ok(Expression::Literal(PrimitiveValue::Int(n))),
            Tok::Double(x) => Ok(Expression::Literal(PrimitiveValue::Double(x))),
            Tok::Expression(e) => Ok(*e),
            Tok::Ident(name) => {
                if let Some(c) = self.context.constant(&name) {
                    return Ok(Expression::Constant {
                        name: c.name.clone(),
                        value: c.value.clone(),
                    });
                }
                let id = self.variables.id_of(&name);
                Ok(Expression::Variable { name, id })
            }
            _ => Err(CalcError::at(
                ErrorKind::NoValidToken,
                format!("Token too much: {}", t.text),
                t.position,
            )),
        }
    }

    /// Postfixé de l’état courant -> un seul arbre.
    fn compress(&mut self) -> Result<Expression, CalcError> {
        let begin = self.current.begin;
        if self.current.tokens.is_empty() {
            return Err(CalcError::at(
                ErrorKind::NoValidToken,
                "Expected an argument",
                begin,
            ));
        }

        let tokens = std::mem::take(&mut self.current.tokens);
        let mut args: Vec<Expression> = Vec::new();

        for t in tokens {
            let Some((id, f)) = self.function_of(&t) else {
                args.push(self.convert_argument(t)?);
                continue;
            };

            let n = args.len();
            if f.is_associative() && f.arity().is_variadic() && n >= 2 {
                let meme_appel = matches!(
                    &args[n - 2],
                    Expression::FunctionCall { function, .. } if *function == id
                );
                if meme_appel {
                    if let Some(dernier) = args.pop() {
                        if let Some(Expression::FunctionCall { arguments, .. }) = args.last_mut() {
                            arguments.push(dernier);
                        }
                    }
                    continue;
                }
            }

            if n >= 2 && f.arity().accepts(2) {
                let b = args.split_off(n - 2);
                args.push(f.build(id, b)?);
                continue;
            }
            // un infixe avec un seul opérande ("1+") reste une erreur
            if n >= 1 && f.arity().accepts(1) && f.notation() != Notation::Infix {
                let a = args.split_off(n - 1);
                args.push(f.build(id, a)?);
                continue;
            }
            return Err(CalcError::at(
                ErrorKind::NoValidToken,
                format!("Could not handle command: {}", t.text),
                t.position,
            ));
        }

        match (args.pop(), args.is_empty()) {
            (Some(e), true) => Ok(e),
            _ => Err(CalcError::at(
                ErrorKind::NoValidToken,
                "Expected Operation",
                begin,
            )),
        }
    }

    /// État fonction courant -> appel (arité vérifiée).
    fn compress_function(&mut self) -> Result<Expression, CalcError> {
        let context: &'a ParserContext = self.context;
        let functions = context.functions();

        let Some(ftok) = self.current.commands.first() else {
            return Err(CalcError::at(
                ErrorKind::NoValidToken,
                "Expected a function",
                self.current.begin,
            ));
        };
        let found = functions
            .find_regular(&ftok.text)
            .and_then(|id| Some((id, functions.get(id)?)));
        let Some((id, f)) = found else {
            return Err(CalcError::at(
                ErrorKind::UnknownFunction,
                format!("Unknown function {}", ftok.text),
                ftok.position,
            ));
        };
        let position = ftok.position;

        let mut arguments = Vec::with_capacity(self.current.tokens.len());
        for t in std::mem::take(&mut self.current.tokens) {
            match t.tok {
                Tok::Expression(e) => arguments.push(*e),
                _ => {
                    return Err(CalcError::at(
                        ErrorKind::NoValidToken,
                        format!("Token too much: {}", t.text),
                        t.position,
                    ))
                }
            }
        }

        if !f.arity().accepts(arguments.len()) {
            return Err(CalcError::at(
                ErrorKind::WrongArgumentCount,
                format!(
                    "{}/{} called with {} arguments",
                    f.name(),
                    f.arity(),
                    arguments.len()
                ),
                position,
            ));
        }
        f.build(id, arguments)
    }
}
