// src/noyau/contexte.rs
//
// Contexte de parse : registre de fonctions + table des constantes,
// et l’allocateur d’identifiants de variables (passé à part, en &mut).

use std::collections::HashMap;

use log::{debug, warn};

use super::fonctions::{FunctionId, FunctionRegistry, NamedFunction};
use super::standard;
use super::valeur::PrimitiveValue;

/// Identifiant dense de variable (commence à 1).
pub type VariableId = usize;

/// Nom <-> identifiant, alloué à la première rencontre, jamais réutilisé.
#[derive(Clone, Debug, Default)]
pub struct VariableIdMapping {
    ids: HashMap<String, VariableId>,
    // names[id - 1]
    names: Vec<String>,
}

impl VariableIdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiant existant ou nouvellement alloué.
    pub fn id_of(&mut self, name: &str) -> VariableId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        self.names.push(name.to_string());
        let id = self.names.len();
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn find(&self, name: &str) -> Option<VariableId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: VariableId) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// (id, nom) dans l’ordre d’allocation.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i + 1, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Constante : nom canonique (utilisé à l’affichage) + valeur.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantEntry {
    pub name: String,
    pub value: PrimitiveValue,
}

#[derive(Debug)]
pub struct ParserContext {
    functions: FunctionRegistry,
    constants: HashMap<String, ConstantEntry>,
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserContext {
    /// Contexte avec les opérateurs fondamentaux (+ * - / négation ^ =).
    pub fn new() -> Self {
        let mut functions = FunctionRegistry::new();
        standard::register_fundamentals(&mut functions);
        Self {
            functions,
            constants: HashMap::new(),
        }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn add_function(&mut self, function: NamedFunction) -> FunctionId {
        self.functions.register(function)
    }

    /// Constante sous son nom canonique et ses alias.
    pub fn add_constant(&mut self, name: &str, value: PrimitiveValue, aliases: &[&str]) {
        let entry = ConstantEntry {
            name: name.to_string(),
            value,
        };
        debug!("constante {name} = {} (alias {:?})", entry.value, aliases);
        for key in std::iter::once(name).chain(aliases.iter().copied()) {
            if self.constants.insert(key.to_string(), entry.clone()).is_some() {
                warn!("constante {key} remplacée");
            }
        }
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantEntry> {
        self.constants.get(name)
    }
}
