//! src/app/etat.rs
//!
//! État de la session SmallCalc (aucun dessin ici).
//!
//! Une session = un `SmallCalc` (variables persistantes d’une ligne à l’autre)
//! + le dernier résultat détaillé + l’historique des lignes évaluées.
//!
//! Bornes : décimales (anti-gel) et longueur de l’historique.

use log::{debug, info};

use smallcalc::noyau::contexte::VariableId;
use smallcalc::noyau::eval::{CalcOptions, Lecture, Resultat, SmallCalc};

/// Chiffres significatifs par défaut (lecture décimale d’une fraction).
const DIGITS_DEFAUT: usize = 20;

/// Garde-fou : on borne la précision.
pub const DIGITS_MAX: usize = 200;

const HISTORIQUE_MAX: usize = 64;

/// Forme de l’arbre montrée pour chaque ligne.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Affichage {
    #[default]
    Lisible,
    /// parenthèses partout : ce que relit le parser
    Complet,
}

/// Une ligne évaluée.
#[derive(Clone, Debug)]
pub struct Ligne {
    pub entree: String,
    pub lisible: String,
    pub complet: String,
    pub valeur: String,
    pub lecture: Option<Lecture>,
    pub erreur: bool,
}

impl Ligne {
    pub fn forme(&self, affichage: Affichage) -> &str {
        match affichage {
            Affichage::Lisible => &self.lisible,
            Affichage::Complet => &self.complet,
        }
    }
}

/// Variable telle que montrée dans le panneau.
#[derive(Clone, Debug, PartialEq)]
pub struct VueVariable {
    pub id: VariableId,
    pub nom: String,
    /// None : rencontrée mais jamais liée
    pub valeur: Option<String>,
}

pub struct Session {
    pub entree: String,
    pub erreur: String,
    pub jetons: String,
    pub historique: Vec<Ligne>,

    pub affichage: Affichage,
    pub digits: usize,
    pub mode_exact: bool,

    calc: SmallCalc,

    /// redonner le focus à l’entrée à la prochaine frame
    pub focus_entree: bool,
}

fn nouveau_calc(mode_exact: bool, digits: usize) -> SmallCalc {
    SmallCalc::with_options(CalcOptions {
        accurate: mode_exact,
        standard_constants: true,
        standard_functions: true,
        decimal_digits: digits,
    })
}

impl Default for Session {
    fn default() -> Self {
        Self {
            entree: String::new(),
            erreur: String::new(),
            jetons: String::new(),
            historique: Vec::new(),
            affichage: Affichage::default(),
            digits: DIGITS_DEFAUT,
            mode_exact: true,
            calc: nouveau_calc(true, DIGITS_DEFAUT),
            focus_entree: true,
        }
    }
}

impl Session {
    /// Évalue l’entrée courante ; l’entrée est vidée si la ligne aboutit.
    pub fn evaluer(&mut self) {
        let s = self.entree.trim().to_string();
        if s.is_empty() {
            return;
        }
        debug!("évaluation de {s:?}");
        let r = self.calc.eval_detaille(&s);
        if self.ajouter(s, r) {
            self.entree.clear();
        }
        self.focus_entree = true;
    }

    /// Range un résultat ; false si c’est une erreur.
    fn ajouter(&mut self, entree: String, r: Resultat) -> bool {
        self.jetons = r.demarche.jetons;

        let (valeur, erreur) = match r.valeur.as_error() {
            Some(e) => {
                let msg = match e.position {
                    Some(p) => format!("{e} (position {p})"),
                    None => e.to_string(),
                };
                (msg, true)
            }
            None => (r.exact, false),
        };
        self.erreur = if erreur { valeur.clone() } else { String::new() };

        if self.historique.len() == HISTORIQUE_MAX {
            self.historique.remove(0);
        }
        self.historique.push(Ligne {
            entree,
            lisible: r.demarche.joli,
            complet: r.demarche.canonique,
            valeur,
            lecture: r.lecture,
            erreur,
        });
        !erreur
    }

    pub fn derniere(&self) -> Option<&Ligne> {
        self.historique.last()
    }

    /// Recopie une ligne de l’historique dans l’entrée.
    pub fn reprendre(&mut self, index: usize) {
        if let Some(l) = self.historique.get(index) {
            self.entree = l.entree.clone();
            self.focus_entree = true;
        }
    }

    pub fn vider_historique(&mut self) {
        self.historique.clear();
        self.erreur.clear();
        self.jetons.clear();
    }

    /// Oublie toutes les variables et l’historique ; garde les réglages.
    pub fn nouvelle_session(&mut self) {
        self.calc = nouveau_calc(self.mode_exact, self.digits);
        self.entree.clear();
        self.vider_historique();
        self.focus_entree = true;
        info!("nouvelle session (variables oubliées)");
    }

    pub fn variables(&self) -> Vec<VueVariable> {
        self.calc
            .variables()
            .map(|(id, nom, v)| VueVariable {
                id,
                nom: nom.to_string(),
                valeur: v.map(ToString::to_string),
            })
            .collect()
    }

    pub fn oublier_variable(&mut self, id: VariableId) {
        self.calc.unset_variable(id);
    }

    pub fn set_digits(&mut self, digits: usize) {
        self.digits = digits.min(DIGITS_MAX);
        self.calc.set_decimal_digits(self.digits);
    }

    pub fn set_mode_exact(&mut self, exact: bool) {
        self.mode_exact = exact;
        self.calc.set_accurate_level(exact);
    }
}
