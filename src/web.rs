//! Browser bindings for the gallery pages.

use wasm_bindgen::prelude::*;

use crate::entry::{self, EntryHall};
use crate::layout_engine::{ImageRecord, LayoutEngine};
use crate::storage::WebStorage;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Warn).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Pack `[{src, width, height}]` into the container and return the layout
/// as JSON
#[wasm_bindgen]
pub fn arrange_collage(width: f32, height: f32, margin: f32, images_json: &str) -> Result<String, JsValue> {
    let images: Vec<ImageRecord> = serde_json::from_str(images_json).map_err(to_js)?;
    let images: Vec<ImageRecord> = images
        .into_iter()
        .filter_map(|image| match ImageRecord::new(image.src, image.width, image.height) {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        })
        .collect();
    let layout = LayoutEngine::new(width, height)
        .with_margin(margin)
        .arrange_collage(&images);
    serde_json::to_string(&layout).map_err(to_js)
}

/// Check the entry code and, when accepted, issue the session ticket
#[wasm_bindgen]
pub fn submit_password(input: &str) -> Result<bool, JsValue> {
    let mut session = WebStorage::session().map_err(to_js)?;
    let mut hall = EntryHall::default();
    let (accepted, _) = hall.submit(input, &mut session, 0);
    Ok(accepted)
}

#[wasm_bindgen]
pub fn has_ticket() -> Result<bool, JsValue> {
    let session = WebStorage::session().map_err(to_js)?;
    Ok(entry::has_ticket(&session))
}
