//! Profile Popup
//!
//! Account details, calculation history and logout. While open the page
//! behind it is blurred and cannot scroll.

use leptos::*;
use leptos_router::use_navigate;

use drawcal::api::ProfileApi;
use drawcal::format::format_number;
use drawcal::overlay::OverlayGuard;
use drawcal::profile::{avatar_initial, display_name, format_timestamp, ProfilePanel, ProfileTab};

use crate::state::{use_session, BodyOverlay};

#[component]
pub fn ProfilePopup(open: RwSignal<bool>) -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();
    let panel = create_rw_signal(ProfilePanel::new());
    let overlay = store_value(None::<OverlayGuard<BodyOverlay>>);

    // Track the open flag and hold the overlay for as long as it is set
    create_effect(move |_| {
        if open.get() {
            panel.update(|p| p.open());
            overlay.update_value(|guard| {
                if guard.is_none() {
                    *guard = Some(OverlayGuard::acquire(BodyOverlay));
                }
            });
        } else {
            panel.update(|p| p.close());
            overlay.update_value(|guard| *guard = None);
        }
    });

    on_cleanup(move || {
        overlay.try_update_value(|guard| *guard = None);
    });

    let wants = create_memo(move |_| panel.with(|p| (p.wants_profile(), p.wants_history())));

    let session_for_fetch = session.clone();
    create_effect(move |_| {
        let (wants_profile, wants_history) = wants.get();
        if !wants_profile {
            return;
        }
        let Some(credentials) = session_for_fetch.credentials() else {
            return;
        };

        let backend = session_for_fetch.backend.clone();
        let profile_credentials = credentials.clone();
        spawn_local(async move {
            let outcome = backend.profile(&profile_credentials).await;
            if let Err(e) = &outcome {
                web_sys::console::error_1(&format!("Error fetching user data: {}", e).into());
            }
            panel.try_update(|p| p.apply_profile(outcome));
        });

        if wants_history {
            let backend = session_for_fetch.backend.clone();
            spawn_local(async move {
                let outcome = backend.history(&credentials).await;
                if let Err(e) = &outcome {
                    web_sys::console::error_1(
                        &format!("Error fetching review expressions: {}", e).into(),
                    );
                }
                panel.try_update(|p| p.apply_history(outcome));
            });
        }
    });

    let session_for_logout = session.clone();
    let on_logout = Callback::new(move |_: ()| {
        let session = session_for_logout.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            session.logout().await;
            open.set(false);
            navigate("/login", Default::default());
        });
    });

    let user = Signal::derive(move || session.user());

    move || {
        if !open.get() {
            return view! {}.into_view();
        }

        view! {
            <div
                class="fixed inset-0 z-[1000] flex items-center justify-center"
                on:click=move |_| open.set(false)
            >
                <div
                    class="flex w-full max-w-3xl min-h-[400px] max-h-[70vh] bg-[#1a1b1e] rounded-md shadow-[0_0_20px_rgb(255,255,255)]"
                    on:click=|ev| ev.stop_propagation()
                >
                    // Sidebar
                    <div class="w-64 bg-[#25262b] border-r border-[#2c2e33] p-4 flex flex-col">
                        <div class="mb-6 flex items-center justify-between">
                            <span class="text-white text-lg font-medium">"Profile"</span>
                            <button
                                on:click=move |_| open.set(false)
                                class="text-white hover:text-gray-200"
                            >
                                "✕"
                            </button>
                        </div>

                        <div class="space-y-4 mb-6 text-center">
                            <div class="mx-auto w-20 h-20 rounded-full bg-[#9ACBD0] flex items-center justify-center text-3xl text-white">
                                {move || avatar_initial(user.get().as_ref()).to_string()}
                            </div>
                            <p class="text-white font-semibold text-lg">
                                {move || display_name(user.get().as_ref()).to_string()}
                            </p>
                            <p class="text-sm text-white/80">
                                {move || user.get().map(|u| u.email).unwrap_or_default()}
                            </p>
                        </div>

                        <div class="flex-1 space-y-2">
                            <TabButton panel=panel tab=ProfileTab::Profile />
                            <TabButton panel=panel tab=ProfileTab::History />
                        </div>

                        <button
                            on:click=move |_| on_logout.call(())
                            class="w-full mt-4 py-2 rounded-md bg-red-600 hover:bg-red-700 text-white"
                        >
                            "Logout"
                        </button>
                    </div>

                    // Content
                    <div class="flex-1 p-6 overflow-y-auto text-white">
                        {move || match panel.with(|p| p.tab()) {
                            ProfileTab::Profile => view! { <AccountDetails panel=panel user=user /> }.into_view(),
                            ProfileTab::History => view! { <HistoryList panel=panel /> }.into_view(),
                        }}
                    </div>
                </div>
            </div>
        }
        .into_view()
    }
}

#[component]
fn TabButton(panel: RwSignal<ProfilePanel>, tab: ProfileTab) -> impl IntoView {
    view! {
        <button
            on:click=move |_| panel.update(|p| p.select(tab))
            class=move || {
                let base = "w-full text-left py-2 px-3 rounded-md";
                if panel.with(|p| p.tab()) == tab {
                    format!("{} bg-white/10 text-white", base)
                } else {
                    format!("{} text-white hover:bg-[#2c2e33]", base)
                }
            }
        >
            {tab.title()}
        </button>
    }
}

#[component]
fn AccountDetails(
    panel: RwSignal<ProfilePanel>,
    #[prop(into)]
    user: Signal<Option<drawcal::api::UserIdentity>>,
) -> impl IntoView {
    let member_since = move || {
        panel
            .with(|p| p.created_at().map(format_timestamp))
            .unwrap_or_else(|| "-".to_string())
    };

    view! {
        <h2 class="text-xl font-semibold mb-4">"Account Details"</h2>
        <dl class="space-y-3">
            <div>
                <dt class="text-sm text-white/60">"Email"</dt>
                <dd>{move || user.get().map(|u| u.email).unwrap_or_default()}</dd>
            </div>
            <div>
                <dt class="text-sm text-white/60">"Role"</dt>
                <dd class="capitalize">{move || user.get().map(|u| u.role).unwrap_or_default()}</dd>
            </div>
            <div>
                <dt class="text-sm text-white/60">"Member since"</dt>
                <dd>{member_since}</dd>
            </div>
        </dl>
    }
}

#[component]
fn HistoryList(panel: RwSignal<ProfilePanel>) -> impl IntoView {
    move || {
        let history = panel.with(|p| p.history().to_vec());
        if history.is_empty() {
            return view! { <p class="text-white/60">"No calculations yet."</p> }.into_view();
        }

        history
            .into_iter()
            .map(|record| view! {
                <div class="mb-3 p-3 rounded-md bg-[#25262b]">
                    <p class="text-xs text-white/60">{format_timestamp(&record.timestamp)}</p>
                    <p class="font-medium">{record.expression}</p>
                    <p>"= " {format_number(&record.result)}</p>
                </div>
            })
            .collect_view()
    }
}
