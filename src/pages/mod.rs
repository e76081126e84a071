use crate::components::{ErrorAlert, TextField};
use crate::compose::{submit_memo, SubmitOutcome};
use crate::models::{MemoDraft, MemoSource, QueuedImage};
use crate::offline::sync_now;
use crate::routes::{post_login_target, LOGIN_PATH, QUEUE_PATH, REGISTER_PATH};
use crate::state::AppContext;
use crate::util::{is_browser_online, preview, read_image};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;
use wasm_bindgen::JsCast;

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let query = use_query_map();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let redirect = query.get_untracked().get("redirect");
        let state = app_state.0.clone();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match state.api_client.login(&email_val, &password_val).await {
                Ok(_) => {
                    state.session_changed();
                    let _ = window()
                        .location()
                        .set_href(&post_login_target(redirect.as_deref()));
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
            <h1 class="mb-4 text-lg">"Log in"</h1>
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <TextField id="email" label="Email" r#type="email" placeholder="you@example.com" required=true bind_value=email />
                <TextField id="password" label="Password" r#type="password" required=true bind_value=password />

                <ErrorAlert error=error />

                <button class="h-8 rounded-md bg-primary text-sm text-primary-foreground" disabled=move || loading.get()>
                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                </button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "No account? "
                    <a class="text-primary underline underline-offset-4" href=REGISTER_PATH>"Sign up"</a>
                </div>
            </form>
        </div>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let success: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();

        if password_val != confirm_password.get() {
            error.set(Some("Passwords do not match".to_string()));
            return;
        }

        if password_val.len() < 6 {
            error.set(Some("Password must be at least 6 characters".to_string()));
            return;
        }

        let state = app_state.0.clone();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match state.api_client.register(&email_val, &password_val).await {
                Ok(_) => success.set(true),
                Err(e) => error.set(Some(e.to_string())),
            }
            loading.set(false);
        });
    };

    view! {
        <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
            <h1 class="mb-4 text-lg">"Create account"</h1>
            <Show
                when=move || !success.get()
                fallback=move || view! {
                    <p class="text-xs">
                        "Account created. You can now "
                        <a class="text-primary underline underline-offset-4" href=LOGIN_PATH>"log in"</a>
                        "."
                    </p>
                }
            >
                <form class="flex flex-col gap-3" on:submit=on_submit.clone()>
                    <TextField id="email" label="Email" r#type="email" required=true bind_value=email />
                    <TextField id="password" label="Password" r#type="password" required=true bind_value=password />
                    <TextField id="confirm-password" label="Confirm password" r#type="password" required=true bind_value=confirm_password />

                    <ErrorAlert error=error />

                    <button class="h-8 rounded-md bg-primary text-sm text-primary-foreground" disabled=move || loading.get()>
                        {move || if loading.get() { "Creating..." } else { "Create account" }}
                    </button>
                </form>
            </Show>
        </div>
    }
}

/// Memo composer. Falls back to the offline queue when the network is down.
#[component]
pub fn HomePage() -> impl IntoView {
    let content: RwSignal<String> = RwSignal::new(String::new());
    let images: RwSignal<Vec<QueuedImage>> = RwSignal::new(vec![]);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let submitting: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let pending_count = app_state.0.pending_count;

    let on_content = move |ev: web_sys::Event| {
        if let Some(area) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        {
            content.set(area.value());
        }
    };

    let on_files = move |ev: web_sys::Event| {
        let Some(files) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.files())
        else {
            return;
        };
        let picked: Vec<web_sys::File> = (0..files.length()).filter_map(|i| files.get(i)).collect();

        spawn_local(async move {
            let mut out = Vec::with_capacity(picked.len());
            for file in &picked {
                match read_image(file).await {
                    Ok(img) => out.push(img),
                    Err(e) => {
                        error.set(Some(e));
                        return;
                    }
                }
            }
            images.set(out);
        });
    };

    let submit_state = app_state.clone();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let state = submit_state.0.clone();
        let draft = MemoDraft {
            content: content.get_untracked(),
            images: images.get_untracked(),
            source: Some(MemoSource::Web),
        };

        submitting.set(true);
        error.set(None);
        notice.set(None);

        spawn_local(async move {
            let online = is_browser_online();
            match submit_memo(&state.api_client, &state.offline_queue, draft, online).await {
                Ok(outcome) => {
                    content.set(String::new());
                    images.set(vec![]);
                    notice.set(Some(match outcome {
                        SubmitOutcome::Created => "Memo saved.".to_string(),
                        SubmitOutcome::Queued => {
                            "You are offline. The memo will be sent once the connection is back."
                                .to_string()
                        }
                    }));
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            state.refresh_pending_count();
            submitting.set(false);
        });
    };

    let sync_state = app_state.clone();
    let on_sync = move |_| sync_now(sync_state.clone());

    let logout_state = app_state.clone();
    let on_logout = move |_| {
        let state = &logout_state.0;
        if let Err(e) = state.api_client.logout() {
            error.set(Some(e.to_string()));
        }
        state.session_changed();
    };

    let authed_state = app_state.clone();
    let is_authenticated = move || authed_state.0.is_authenticated();

    view! {
        <div class="mx-auto flex min-h-screen w-full max-w-xl flex-col gap-4 px-4 py-10">
            <header class="flex items-center justify-between text-xs">
                <span class="font-medium">"Memos"</span>
                <Show
                    when=is_authenticated
                    fallback=|| view! { <a class="underline underline-offset-4" href=LOGIN_PATH>"Log in"</a> }
                >
                    <button class="underline underline-offset-4" on:click=on_logout.clone()>"Log out"</button>
                </Show>
            </header>

            <form class="flex flex-col gap-3" on:submit=on_submit>
                <textarea
                    class="min-h-32 rounded-md border bg-transparent p-3 text-sm"
                    placeholder="What's on your mind?"
                    prop:value=move || content.get()
                    on:input=on_content
                />
                <input type="file" accept="image/*" multiple=true on:change=on_files />
                <div class="text-xs text-muted-foreground">
                    {move || match images.with(|v| v.len()) {
                        0 => String::new(),
                        n => format!("{n} image(s) attached"),
                    }}
                </div>

                <ErrorAlert error=error />
                {move || notice.get().map(|n| view! { <p class="text-xs">{n}</p> })}

                <button class="h-8 rounded-md bg-primary text-sm text-primary-foreground" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Saving..." } else { "Save memo" }}
                </button>
            </form>

            <Show when=move || { pending_count.get() > 0 } fallback=|| ().into_view()>
                <div class="flex items-center justify-between rounded-md border px-3 py-2 text-xs">
                    <a class="underline underline-offset-4" href=QUEUE_PATH>
                        {move || format!("{} memo(s) waiting to sync", pending_count.get())}
                    </a>
                    <button class="underline underline-offset-4" on:click=on_sync.clone()>"Sync now"</button>
                </div>
            </Show>
        </div>
    }
}

/// Memos parked in the offline queue.
#[component]
pub fn QueuePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let pending_count = app_state.0.pending_count;
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let list_state = app_state.clone();
    let items = move || {
        pending_count.track();
        match list_state.0.offline_queue.get_queue() {
            Ok(q) => q,
            Err(e) => {
                error.set(Some(e.to_string()));
                vec![]
            }
        }
    };

    let sync_state = app_state.clone();
    let on_sync = move |_| sync_now(sync_state.clone());

    let discard_state = app_state.clone();
    let on_discard = move |_| {
        let state = &discard_state.0;
        if let Err(e) = state.offline_queue.clear() {
            error.set(Some(e.to_string()));
        }
        state.refresh_pending_count();
    };

    view! {
        <div class="mx-auto flex min-h-screen w-full max-w-xl flex-col gap-4 px-4 py-10">
            <header class="flex items-center justify-between text-xs">
                <a class="underline underline-offset-4" href="/">"Back"</a>
                <div class="flex gap-3">
                    <button class="underline underline-offset-4" on:click=on_sync>"Sync now"</button>
                    <button class="text-destructive underline underline-offset-4" on:click=on_discard>"Discard all"</button>
                </div>
            </header>

            <ErrorAlert error=error />

            <ul class="flex flex-col gap-2">
                {move || {
                    items()
                        .into_iter()
                        .map(|op| {
                            let meta = format!(
                                "{} · from {} · {} image(s) · {} failed attempt(s)",
                                op.enqueued_at.format("%Y-%m-%d %H:%M"),
                                op.source,
                                op.images.len(),
                                op.retry_count,
                            );
                            view! {
                                <li class="rounded-md border px-3 py-2">
                                    <p class="text-sm">{preview(&op.content, 80)}</p>
                                    <p class="text-xs text-muted-foreground">{meta}</p>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}
