use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::path;

use crate::components::sidebar::Sidebar;
use crate::pages::analysis::{AnalysisPage, AnalysisSession};
use crate::pages::health::HealthPage;
use crate::pages::settings::SettingsPage;

#[component]
pub fn App() -> impl IntoView {
    let session = AnalysisSession::new();
    provide_context(session);

    // Adopt the backend session on mount (it outlives webview reloads)
    Effect::new(move |_| {
        session.restore();
    });

    view! {
        <Router>
            <div class="app-layout">
                <Sidebar />
                <main class="content">
                    <Routes fallback=|| view! { <p>"Page not found"</p> }>
                        <Route path=path!("/") view=AnalysisPage />
                        <Route path=path!("/settings") view=SettingsPage />
                        <Route path=path!("/health") view=HealthPage />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}
