// src/noyau/jetons.rs
//
// Tokenisation :
// - blancs = séparateurs (ils bloquent aussi la fusion des exposants)
// - ( ) + - * / ^ , = : toujours un jeton à eux seuls
// - notation exponentielle fusionnée a posteriori (3e4, 3e+4, 3.2e-4)
// - "2sin" -> 2, sin   (multiplication implicite au parse)
// - moins unaire : MINUS -> NEGATE, puis fusion avec le littéral suivant (-2)
//
// Aucune erreur lexicale : tout ce qui n’est ni nombre ni symbole devient Ident.

use super::expr::Expression;
use super::valeur::CalcError;

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Lp,
    Rp,
    Int(i64),
    Double(f64),
    Plus,
    Minus,
    Negate,
    Asterisk,
    Slash,
    Circumflex,
    Comma,
    Equals,
    // sous-arbre déjà réduit, réinjecté pendant le parse
    Expression(Box<Expression>),
    // variable, fonction ou constante : décidé au parse
    Ident(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub text: String,
    /// décalage (octets) dans le texte source
    pub position: usize,
}

impl Token {
    /// Classe un morceau de texte.
    pub fn classify(text: &str, position: usize) -> Self {
        let tok = match text {
            "(" => Tok::Lp,
            ")" => Tok::Rp,
            "+" => Tok::Plus,
            "-" => Tok::Minus,
            "*" => Tok::Asterisk,
            "/" => Tok::Slash,
            "^" => Tok::Circumflex,
            "," => Tok::Comma,
            "=" => Tok::Equals,
            _ => {
                if let Ok(n) = text.parse::<i64>() {
                    Tok::Int(n)
                } else if let Some(x) = parse_double(text) {
                    Tok::Double(x)
                } else {
                    Tok::Ident(text.to_string())
                }
            }
        };
        Self {
            tok,
            text: text.to_string(),
            position,
        }
    }

    pub fn expression(e: Expression, position: usize) -> Self {
        Self {
            tok: Tok::Expression(Box::new(e)),
            text: String::new(),
            position,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self.tok, Tok::Int(_) | Tok::Double(_))
    }

    /// Après ce jeton, un '-' est un moins unaire.
    fn opens_negation(&self) -> bool {
        matches!(
            self.tok,
            Tok::Lp
                | Tok::Plus
                | Tok::Minus
                | Tok::Asterisk
                | Tok::Negate
                | Tok::Slash
                | Tok::Circumflex
                | Tok::Comma
                | Tok::Equals
        )
    }
}

/// Flottant au sens strict : chiffres, '.', exposant, signes (pas de inf / nan).
fn parse_double(text: &str) -> Option<f64> {
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '.' | '+' | '-')) {
        return None;
    }
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    text.parse().ok()
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

fn is_single_char(c: char) -> bool {
    matches!(c, '(' | ')' | '+' | '-' | '*' | '/' | '^' | ',' | '=')
}

/// "2sin" -> ("2", "sin") ; "2.5e" -> ("2.5", "e") ; "sin" -> None.
fn split_num_and_text(text: &str) -> Option<(&str, &str)> {
    let mut found_num = false;
    let mut found_exp = false;
    let mut found_dot = false;
    let mut found_sign = false;
    let mut end = text.len();

    for (i, c) in text.char_indices() {
        match c {
            '0'..='9' => found_num = true,
            '-' | '+' if !found_sign => found_sign = true,
            'e' if found_num && !found_exp => {
                // l’exposant doit être suivi d’un nombre (signe possible)
                found_exp = true;
                found_sign = false;
                found_num = false;
            }
            '.' if !found_dot && !found_exp => found_dot = true,
            _ => {
                end = i;
                break;
            }
        }
    }

    // "2341e" : le 'e' final est la constante d’Euler
    if end == text.len() && found_exp && !found_num && text.ends_with('e') {
        found_num = true;
        end -= 1;
    }
    if !found_num || end == text.len() {
        return None;
    }
    Some(text.split_at(end))
}

/* ------------------------ Tokenizer ------------------------ */

/// `None` = blanc (séparateur), retiré à la fin.
struct Brouillon {
    jetons: Vec<Option<Token>>,
}

impl Brouillon {
    /// Ajoute un morceau ; un entier peut refermer une écriture exponentielle.
    fn push(&mut self, text: &str, position: usize) {
        let token = Token::classify(text, position);

        if matches!(token.tok, Tok::Int(_)) {
            // 3e+4 (trois jetons), puis 3e4 / 3e-... (deux)
            for n in [3, 2] {
                if let Some(fusion) = self.fusion(n, text) {
                    self.jetons.truncate(self.jetons.len() - n);
                    self.jetons.push(Some(fusion));
                    return;
                }
            }
        }

        if matches!(token.tok, Tok::Ident(_)) {
            if let Some((num, reste)) = split_num_and_text(text) {
                self.jetons.push(Some(Token::classify(num, position)));
                self.jetons
                    .push(Some(Token::classify(reste, position + num.len())));
                return;
            }
        }

        self.jetons.push(Some(token));
    }

    /// Concatène les `n` derniers jetons (sans blanc) + `text` : flottant ?
    fn fusion(&self, n: usize, text: &str) -> Option<Token> {
        let debut = self.jetons.len().checked_sub(n)?;
        let mut concat = String::new();
        let mut position = None;
        for j in &self.jetons[debut..] {
            let j = j.as_ref()?;
            position.get_or_insert(j.position);
            concat.push_str(&j.text);
        }
        concat.push_str(text);
        let t = Token::classify(&concat, position?);
        matches!(t.tok, Tok::Double(_)).then_some(t)
    }

    fn fixup_negations(&mut self) {
        if self.jetons.len() < 2 {
            return;
        }

        // 1) repérage
        for i in 0..self.jetons.len() {
            let unaire = i == 0
                || self.jetons[i - 1]
                    .as_ref()
                    .is_some_and(Token::opens_negation);
            if let Some(t) = self.jetons[i].as_mut() {
                if t.tok == Tok::Minus && unaire {
                    t.tok = Tok::Negate;
                }
            }
        }

        // 2) fusion NEGATE + littéral
        for i in 0..self.jetons.len().saturating_sub(1) {
            let position = match &self.jetons[i] {
                Some(t) if t.tok == Tok::Negate => t.position,
                _ => continue,
            };
            let texte = match &self.jetons[i + 1] {
                Some(next) if next.is_number() => format!("-{}", next.text),
                _ => continue,
            };
            self.jetons[i + 1] = Some(Token::classify(&texte, position));
            self.jetons[i] = None;
        }
    }
}

/// Découpe `input` en jetons (les positions sont des décalages en octets).
pub fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut b = Brouillon { jetons: Vec::new() };
    let mut in_empty = true;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if in_empty {
            if is_blank(c) {
                continue;
            }
            start = i;
            in_empty = false;
        }
        if is_blank(c) {
            b.push(&input[start..i], start);
            in_empty = true;
            b.jetons.push(None);
        }
        if is_single_char(c) {
            if i > start {
                b.push(&input[start..i], start);
            }
            b.push(&input[i..i + c.len_utf8()], i);
            in_empty = true;
        }
    }
    if !in_empty {
        b.push(&input[start..], start);
    }

    b.fixup_negations();
    Ok(b.jetons.into_iter().flatten().collect())
}

/// Format utilitaire (démarche) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match &t.tok {
            Tok::Negate => "neg".to_string(),
            Tok::Expression(_) => "…".to_string(),
            _ => t.text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
