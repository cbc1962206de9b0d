// src/app/vue.rs
//
// Vue egui d’une session SmallCalc
// --------------------------------
// - bandeau : mode exact, décimales, forme de l’arbre, nouvelle session
// - panneau droit : variables (valeur courante, oubli)
// - centre : historique (entrée, arbre affiché, valeur) puis la ligne de saisie
//
// Enter évalue ; une ligne en erreur reste dans l’entrée pour correction.

use eframe::egui;

use super::etat::{Affichage, Ligne, Session, DIGITS_MAX};

impl Session {
    pub fn ui(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("reglages").show(ctx, |ui| self.ui_reglages(ui));

        egui::SidePanel::right("variables")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| self.ui_variables(ui));

        egui::TopBottomPanel::bottom("saisie").show(ctx, |ui| self.ui_saisie(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.ui_historique(ui));
    }

    /* ------------------------ Bandeau ------------------------ */

    fn ui_reglages(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.heading("SmallCalc");
            ui.separator();

            let mut exact = self.mode_exact;
            if ui
                .checkbox(&mut exact, "Exact")
                .on_hover_text("Entiers et fractions exacts, repli flottant au dépassement")
                .changed()
            {
                self.set_mode_exact(exact);
            }

            let mut d = self.digits;
            ui.label("Décimales :");
            if ui
                .add(egui::DragValue::new(&mut d).range(0..=DIGITS_MAX))
                .changed()
            {
                self.set_digits(d);
            }

            ui.separator();
            ui.label("Arbre :");
            ui.radio_value(&mut self.affichage, Affichage::Lisible, "lisible")
                .on_hover_text("Parenthèses minimales");
            ui.radio_value(&mut self.affichage, Affichage::Complet, "complet")
                .on_hover_text("Parenthèses partout : relu tel quel par le parser");

            ui.separator();
            if ui.button("Effacer l’historique").clicked() {
                self.vider_historique();
            }
            if ui
                .button("Nouvelle session")
                .on_hover_text("Oublie aussi les variables")
                .clicked()
            {
                self.nouvelle_session();
            }
        });
    }

    /* ------------------------ Variables ------------------------ */

    fn ui_variables(&mut self, ui: &mut egui::Ui) {
        ui.heading("Variables");
        ui.add_space(4.0);

        let variables = self.variables();
        if variables.is_empty() {
            ui.weak("aucune (ex: x = 1/3)");
            return;
        }

        let mut oubli = None;
        egui::ScrollArea::vertical()
            .id_salt("variables_scroll")
            .show(ui, |ui| {
                egui::Grid::new("variables_grille")
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        for v in &variables {
                            ui.monospace(&v.nom);
                            match &v.valeur {
                                Some(valeur) => {
                                    ui.monospace(valeur);
                                    if ui.small_button("oublier").clicked() {
                                        oubli = Some(v.id);
                                    }
                                }
                                None => {
                                    ui.weak("non liée");
                                    ui.label("");
                                }
                            }
                            ui.end_row();
                        }
                    });
            });

        if let Some(id) = oubli {
            self.oublier_variable(id);
        }
    }

    /* ------------------------ Historique ------------------------ */

    fn ui_historique(&mut self, ui: &mut egui::Ui) {
        if self.historique.is_empty() {
            ui.weak("Ex: 1/3 + 1/6, x = 2^-3, 2sin(pi/4), √(2)");
            return;
        }

        let mut reprise = None;
        egui::ScrollArea::vertical()
            .id_salt("historique_scroll")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for (i, ligne) in self.historique.iter().enumerate() {
                    if Self::ui_ligne(ui, ligne, self.affichage) {
                        reprise = Some(i);
                    }
                    ui.separator();
                }
            });

        if let Some(i) = reprise {
            self.reprendre(i);
        }
    }

    /// Une ligne d’historique ; true si l’utilisateur veut la reprendre.
    fn ui_ligne(ui: &mut egui::Ui, ligne: &Ligne, affichage: Affichage) -> bool {
        let mut reprendre = false;
        ui.horizontal(|ui| {
            reprendre = ui
                .small_button("↺")
                .on_hover_text("Reprendre cette entrée")
                .clicked();
            ui.monospace(&ligne.entree);
        });

        if ligne.erreur {
            ui.colored_label(ui.visuals().error_fg_color, &ligne.valeur);
            return reprendre;
        }

        let forme = ligne.forme(affichage);
        if !forme.is_empty() && forme != ligne.entree {
            ui.weak(forme);
        }
        ui.horizontal(|ui| {
            ui.strong(&ligne.valeur);
            if let Some(l) = &ligne.lecture {
                ui.monospace(l.to_string());
            }
        });
        reprendre
    }

    /* ------------------------ Saisie ------------------------ */

    fn ui_saisie(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.entree)
                .id_salt("entree")
                .desired_width(ui.available_width())
                .hint_text("expression ou affectation, Enter pour évaluer")
                .code_editor(),
        );

        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.evaluer();
        }
        if self.focus_entree {
            resp.request_focus();
            self.focus_entree = false;
        }

        if !self.erreur.is_empty() {
            ui.colored_label(ui.visuals().error_fg_color, &self.erreur);
        }
        if !self.jetons.is_empty() {
            ui.weak(format!("jetons : {}", self.jetons));
        }
        ui.add_space(4.0);
    }
}
