/// Tab Muter - Browser extension that keeps only the active tab audible
/// Built with Rust + WASM + Yew

mod chrome;
mod domain;
mod host;
mod membership;
mod operations;
mod router;
mod storage;
mod tab_data;
#[cfg(test)]
mod testing;
pub mod ui;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export hostname extraction for JavaScript access
#[wasm_bindgen]
pub fn extract_hostname(url: &str) -> String {
    domain::extract_hostname(url)
}

// Start the background event loop, once per service-worker instance
#[wasm_bindgen]
pub fn start_background() {
    let (queue, events) = router::event_queue();
    chrome::forward_events(queue.clone());

    // The process may have been recreated between events; reload right away
    if queue.unbounded_send(host::HostEvent::Wake).is_err() {
        log::warn!("event queue closed before wake");
    }

    let router = router::Router::new(chrome::ChromeHost);
    spawn_local(async move {
        router::run(router, events).await;
    });
}

// Start the Yew app for the options page
#[wasm_bindgen]
pub fn start_options() {
    yew::Renderer::<ui::options::OptionsPage>::new().render();
}
