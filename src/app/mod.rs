use crate::config::EnvConfig;
use crate::offline::start_online_listener;
use crate::pages::{HomePage, LoginPage, QueuePage, RegisterPage};
use crate::routes::{
    access_for, guard, with_query, GuardDecision, HOME_PATH, LOGIN_PATH, MEMO_CREATE_PATH,
    QUEUE_PATH, REGISTER_PATH,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let app_state = AppContext(AppState::new(EnvConfig::new()));

    let online_listener = start_online_listener(app_state.clone());
    on_cleanup(move || online_listener.remove());

    provide_context(app_state);

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=|| view! {
                    <Guarded path=LOGIN_PATH>
                        <LoginPage />
                    </Guarded>
                } />
                <Route path=path!("register") view=|| view! {
                    <Guarded path=REGISTER_PATH>
                        <RegisterPage />
                    </Guarded>
                } />
                <Route path=path!("memo/create") view=|| view! {
                    <Guarded path=MEMO_CREATE_PATH>
                        <HomePage />
                    </Guarded>
                } />
                <Route path=path!("queue") view=|| view! {
                    <Guarded path=QUEUE_PATH>
                        <QueuePage />
                    </Guarded>
                } />
                <Route path=path!("") view=|| view! {
                    <Guarded path=HOME_PATH>
                        <HomePage />
                    </Guarded>
                } />
            </Routes>
        </Router>
    }
}

/// Applies the route's access rule before rendering its page.
#[component]
fn Guarded(path: &'static str, children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let location = use_location();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| {
        let full_path = with_query(&location.pathname.get(), &location.search.get());
        guard(access_for(path), app_state.0.is_authenticated(), &full_path)
    });

    Effect::new(move |_| {
        if let Some(target) = decision.get().target() {
            navigate(&target, Default::default());
        }
    });

    let children = StoredValue::new(children);

    view! {
        <Show when=move || decision.get() == GuardDecision::Proceed>
            {move || children.with_value(|c| c())}
        </Show>
    }
}
