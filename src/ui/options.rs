/// Options page: domain lists and mode flags

use crate::domain::{format_domain_list, parse_domain_list};
use crate::storage::{Settings, EXCLUDED_DOMAINS, INCLUDED_DOMAINS, MUTE_SPECIFIC_ONLY, STICKY_MODE};
use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/options.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> Result<(), JsValue>;
}

#[derive(Clone, PartialEq)]
enum PageState {
    Loading,
    Idle,
    Saved,
    Error(String),
}

#[function_component(OptionsPage)]
pub fn options_page() -> Html {
    let state = use_state(|| PageState::Loading);
    let excluded_text = use_state(String::new);
    let included_text = use_state(String::new);
    let mute_specific_only = use_state(|| false);
    let sticky_mode = use_state(|| false);

    // Load settings on mount
    {
        let state = state.clone();
        let excluded_text = excluded_text.clone();
        let included_text = included_text.clone();
        let mute_specific_only = mute_specific_only.clone();
        let sticky_mode = sticky_mode.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_settings().await {
                    Ok(settings) => {
                        excluded_text.set(format_domain_list(&settings.excluded_domains));
                        included_text.set(format_domain_list(&settings.included_domains));
                        mute_specific_only.set(settings.mute_specific_only);
                        sticky_mode.set(settings.sticky_mode);
                        state.set(PageState::Idle);
                    }
                    Err(e) => {
                        state.set(PageState::Error(format!("Failed to load: {}", e)));
                    }
                }
            });
            || ()
        });
    }

    let on_excluded_input = text_setter(excluded_text.clone());
    let on_included_input = text_setter(included_text.clone());
    let on_mode_change = flag_setter(mute_specific_only.clone());
    let on_sticky_change = flag_setter(sticky_mode.clone());

    // Save handler
    let on_save = {
        let state = state.clone();
        let excluded_text = excluded_text.clone();
        let included_text = included_text.clone();
        let mute_specific_only = mute_specific_only.clone();
        let sticky_mode = sticky_mode.clone();

        Callback::from(move |_| {
            let settings = settings_from_form(
                &excluded_text,
                &included_text,
                *mute_specific_only,
                *sticky_mode,
            );
            let state = state.clone();

            spawn_local(async move {
                match save_settings(&settings).await {
                    Ok(()) => state.set(PageState::Saved),
                    Err(e) => state.set(PageState::Error(format!("Failed to save: {}", e))),
                }
            });
        })
    };

    let is_loading = matches!(*state, PageState::Loading);

    html! {
        <div class="padding-20">
            <h1 class="options-title">{"Tab Muter Options"}</h1>

            {match &*state {
                PageState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                PageState::Saved => html! {
                    <Alert r#type={AlertType::Success} title={"Settings saved!"} inline={true}>
                    </Alert>
                },
                PageState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                PageState::Idle => html! {}
            }}

            <label class="option-row">
                <input
                    type="checkbox"
                    checked={*mute_specific_only}
                    onchange={on_mode_change}
                />
                {"Mute only specific domains"}
            </label>

            <label class="option-row">
                <input
                    type="checkbox"
                    checked={*sticky_mode}
                    onchange={on_sticky_change}
                />
                {"Sticky mode: keep the last managed tab audible when switching to unmanaged tabs"}
            </label>

            if *mute_specific_only {
                <div class="domain-section">
                    <h2>{"Domains to mute (one per line)"}</h2>
                    <textarea
                        rows="10"
                        value={(*included_text).clone()}
                        oninput={on_included_input}
                    />
                </div>
            } else {
                <div class="domain-section">
                    <h2>{"Domains never to mute (one per line)"}</h2>
                    <textarea
                        rows="10"
                        value={(*excluded_text).clone()}
                        oninput={on_excluded_input}
                    />
                </div>
            }

            <Button onclick={on_save} disabled={is_loading} variant={ButtonVariant::Primary}>
                {"Save"}
            </Button>
        </div>
    }
}

fn text_setter(target: UseStateHandle<String>) -> Callback<InputEvent> {
    Callback::from(move |e: InputEvent| {
        if let Some(input) = e.target_dyn_into::<HtmlTextAreaElement>() {
            target.set(input.value());
        }
    })
}

fn flag_setter(target: UseStateHandle<bool>) -> Callback<Event> {
    Callback::from(move |e: Event| {
        if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
            target.set(input.checked());
        }
    })
}

/// Build the record to store from the raw form values
fn settings_from_form(
    excluded_text: &str,
    included_text: &str,
    mute_specific_only: bool,
    sticky_mode: bool,
) -> Settings {
    Settings {
        excluded_domains: parse_domain_list(excluded_text),
        included_domains: parse_domain_list(included_text),
        mute_specific_only,
        sticky_mode,
    }
}

// Helper functions

async fn load_settings() -> Result<Settings, String> {
    let keys = [EXCLUDED_DOMAINS, INCLUDED_DOMAINS, MUTE_SPECIFIC_ONLY, STICKY_MODE];
    let keys_js = serde_wasm_bindgen::to_value(&keys)
        .map_err(|e| format!("Failed to serialize: {:?}", e))?;

    let settings_js = getStorage(keys_js)
        .await
        .map_err(|e| format!("Failed to get storage: {:?}", e))?;

    if settings_js.is_null() || settings_js.is_undefined() {
        return Ok(Settings::default());
    }

    serde_wasm_bindgen::from_value(settings_js)
        .map_err(|e| format!("Failed to parse settings: {:?}", e))
}

async fn save_settings(settings: &Settings) -> Result<(), String> {
    let settings_js = serde_wasm_bindgen::to_value(settings)
        .map_err(|e| format!("Failed to serialize settings: {:?}", e))?;

    setStorage(settings_js)
        .await
        .map_err(|e| format!("Failed to save storage: {:?}", e))?;

    Ok(())
}
