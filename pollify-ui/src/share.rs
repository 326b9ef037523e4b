//! Clipboard access for share links

use wasm_bindgen::JsCast;

/// Copy `text` with the async Clipboard API
pub async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or("No window")?;
    let navigator = window.navigator();

    let clipboard = js_sys::Reflect::get(&navigator, &"clipboard".into())
        .map_err(|_| "Clipboard not available".to_string())?;
    if clipboard.is_undefined() {
        return Err("Clipboard not available".to_string());
    }

    let write_text = js_sys::Reflect::get(&clipboard, &"writeText".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .ok_or("Clipboard not available")?;

    let promise = write_text
        .call1(&clipboard, &text.into())
        .ok()
        .and_then(|p| p.dyn_into::<js_sys::Promise>().ok())
        .ok_or("Clipboard write failed")?;

    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| format!("Clipboard write failed: {:?}", e))
}
