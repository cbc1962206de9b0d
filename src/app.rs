// src/app.rs
//
// Hôte SmallCalc : session (etat.rs) + vue egui (vue.rs).
// Raccourcis globaux : Esc vide l’entrée, Ctrl/Cmd+L vide l’historique.

pub mod etat;
pub mod vue;

pub use etat::Session;

use eframe::egui;

impl eframe::App for Session {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (esc, clr) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.modifiers.command && i.key_pressed(egui::Key::L),
            )
        });
        if esc {
            self.entree.clear();
            self.focus_entree = true;
        }
        if clr {
            self.vider_historique();
        }

        self.ui(ctx);
    }
}
