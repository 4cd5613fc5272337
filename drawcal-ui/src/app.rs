//! App Root Component
//!
//! Routing and the session provider.

use leptos::*;
use leptos_router::*;

use crate::components::Loading;
use crate::pages::{Home, Login};
use crate::state::{provide_session, use_session};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_session();

    view! {
        <Router>
            <main class="min-h-screen bg-white text-gray-900">
                <Routes>
                    <Route path="/" view=|| view! { <Redirect path="/canvas" /> } />
                    <Route path="/login" view=Login />
                    // OAuth redirect target; the login screen picks up the token
                    <Route path="/auth/callback" view=Login />
                    <Route
                        path="/canvas"
                        view=|| view! { <RequireSession><Home /></RequireSession> }
                    />
                    <Route path="/*any" view=NotFound />
                </Routes>
            </main>
        </Router>
    }
}

/// Render children only for a signed-in user
#[component]
fn RequireSession(children: ChildrenFn) -> impl IntoView {
    let session = use_session();

    move || {
        if session.is_loading() {
            view! { <Loading /> }.into_view()
        } else if session.is_authenticated() {
            children().into_view()
        } else {
            view! { <Redirect path="/login" /> }.into_view()
        }
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-500 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/canvas"
                class="px-6 py-3 bg-blue-600 hover:bg-blue-700 text-white rounded-lg font-medium transition-colors"
            >
                "Go to Canvas"
            </A>
        </div>
    }
}
