use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Labelled single-line input bound to a string signal.
#[component]
pub fn TextField(
    #[prop(into)] id: String,
    #[prop(into)] label: String,
    #[prop(into, default = "text")] r#type: &'static str,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] required: bool,
    #[prop(into, optional)] class: String,
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "h-8 w-full rounded-md border bg-transparent px-3 text-sm outline-none",
        "focus-visible:ring-2 focus-visible:ring-ring/50",
        class
    );

    let on_input = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            bind_value.set(input.value());
        }
    };

    view! {
        <div class="flex flex-col gap-1.5">
            <label for=id.clone() class="text-xs">{label}</label>
            <input
                id=id
                type=r#type
                class=merged_class
                placeholder=placeholder
                required=required
                prop:value=move || bind_value.get()
                on:input=on_input
            />
        </div>
    }
}

/// Shows the message when the signal holds one.
#[component]
pub fn ErrorAlert(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        {move || {
            error.get().map(|e| {
                view! {
                    <div role="alert" class="rounded-lg border border-destructive/30 px-4 py-3 text-xs text-destructive">
                        {e}
                    </div>
                }
            })
        }}
    }
}
