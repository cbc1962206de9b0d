// src/main.rs
//
// Lanceur de l’hôte SmallCalc (feature `app`).
// Natif : fenêtre eframe, journal via env_logger (RUST_LOG=smallcalc=debug).
// wasm32 : rendu dans <canvas id="smallcalc"> de la page hôte.

mod app;

use app::Session;

const TITRE: &str = "SmallCalc";

#[cfg(target_arch = "wasm32")]
const CANVAS_ID: &str = "smallcalc";

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("démarrage de {TITRE}");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(TITRE)
            .with_inner_size([780.0, 560.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        TITRE,
        options,
        Box::new(|_cc| Ok(Box::<Session>::default())),
    )
}

// en wasm32 le point d’entrée réel est `demarrer_web`
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn demarrer_web() -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .ok_or_else(|| {
            wasm_bindgen::JsValue::from_str("aucun <canvas id=\"smallcalc\"> dans la page")
        })?;

    eframe::WebRunner::new()
        .start(
            canvas,
            eframe::WebOptions::default(),
            Box::new(|_cc| Ok(Box::<Session>::default())),
        )
        .await
}
