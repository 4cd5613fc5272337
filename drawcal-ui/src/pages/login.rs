//! Login Page
//!
//! Google sign-in, the OAuth callback token handler and the password form.

use leptos::*;
use leptos_router::*;

use drawcal::api::{Credentials, UserIdentity};
use drawcal::login::{authenticate_password, google_login_url, token_from_query, verify_token, LoginError};

use crate::components::InlineLoading;
use crate::state::{use_session, SessionContext};

#[component]
pub fn Login() -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();
    let location = use_location();

    let (error, set_error) = create_signal(None::<String>);
    let (loading, set_loading) = create_signal(false);
    let (username, set_username) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());

    // Sign the user in once, after a successful verification or password check
    let complete = {
        let session = session.clone();
        Callback::new(move |(credentials, user): (Credentials, UserIdentity)| {
            match session.login(credentials, user) {
                Ok(()) => navigate("/canvas", Default::default()),
                Err(e) => set_error.set(Some(LoginError::from(e).to_string())),
            }
        })
    };

    // Token handed back by the OAuth redirect
    let session_for_token = session.clone();
    create_effect(move |_| {
        let Some(token) = token_from_query(&location.search.get()) else {
            return;
        };

        let session = session_for_token.clone();
        spawn_local(async move {
            set_loading.set(true);
            set_error.set(None);

            match verify_token(&session.backend, &token).await {
                Ok(verified) => complete.call(verified),
                Err(e) => {
                    web_sys::console::error_1(&format!("Token verification error: {}", e).into());
                    set_error.set(Some(e.to_string()));
                }
            }

            set_loading.set(false);
        });
    });

    let session_for_form = session.clone();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let session = session_for_form.clone();
        let (user, pass) = (username.get(), password.get());
        set_error.set(None);
        set_loading.set(true);

        spawn_local(async move {
            match authenticate_password(&session.backend, &user, &pass).await {
                Ok(authenticated) => complete.call(authenticated),
                Err(e) => {
                    web_sys::console::error_1(&format!("Login error: {}", e).into());
                    set_error.set(Some(e.to_string()));
                }
            }
            set_loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-gradient-to-br from-[#3A59D1] to-[#B5FCCD] flex flex-col items-center justify-center p-4">
            <div class="w-full max-w-md mx-auto">
                <div class="text-center mb-12">
                    <h1 class="text-5xl font-bold mb-4">"Welcome to DrawCal"</h1>
                    <p class="text-2xl text-gray-700">"Where Math Meets Creativity"</p>
                </div>

                <div class="w-full bg-white/90 rounded-lg shadow-xl p-8 space-y-6">
                    <h2 class="text-3xl text-center">"Get Started"</h2>

                    {move || error.get().map(|message| view! {
                        <div class="p-4 bg-red-50 border border-red-200 rounded-lg">
                            <p class="text-sm text-center text-red-600">{message}</p>
                        </div>
                    })}

                    <GoogleButton session=session.clone() loading=loading />

                    <div class="text-center text-sm text-gray-500">"or"</div>

                    <form on:submit=on_submit class="space-y-4">
                        <input
                            type="text"
                            placeholder="Username"
                            required
                            prop:value=username
                            on:input=move |ev| set_username.set(event_target_value(&ev))
                            disabled=move || loading.get()
                            class="w-full border rounded-md px-4 py-3"
                        />
                        <input
                            type="password"
                            placeholder="Password"
                            required
                            prop:value=password
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                            disabled=move || loading.get()
                            class="w-full border rounded-md px-4 py-3"
                        />
                        <button
                            type="submit"
                            disabled=move || loading.get()
                            class="w-full bg-blue-600 hover:bg-blue-700 disabled:bg-gray-400 text-white
                                   rounded-md py-3 font-semibold flex items-center justify-center space-x-2"
                        >
                            {move || if loading.get() {
                                view! {
                                    <InlineLoading />
                                    <span>"Signing in..."</span>
                                }.into_view()
                            } else {
                                view! { <span>"Sign in"</span> }.into_view()
                            }}
                        </button>
                    </form>
                </div>
            </div>
        </div>
    }
}

/// Redirects the browser to the backend's Google sign-in
#[component]
fn GoogleButton(session: SessionContext, #[prop(into)] loading: Signal<bool>) -> impl IntoView {
    let url = google_login_url(session.backend.base_url());

    let on_click = move |_| {
        let outcome = web_sys::window()
            .map(|window| window.location().set_href(&url))
            .transpose();
        if let Err(e) = outcome {
            web_sys::console::error_1(&e);
        }
    };

    view! {
        <button
            on:click=on_click
            disabled=move || loading.get()
            class="w-full flex items-center justify-center space-x-2 border border-gray-300
                   rounded-md py-3 font-medium hover:bg-gray-50"
        >
            <span>"Continue with Google"</span>
        </button>
    }
}
