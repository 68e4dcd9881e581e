use leptos::prelude::*;
use leptos_router::hooks::use_location;

/// Routes shown in the navigation, in display order.
const NAV_ITEMS: [(&str, &str); 3] = [
    ("/", "Analyze"),
    ("/settings", "Settings"),
    ("/health", "Health Check"),
];

fn is_active(current: &str, href: &str) -> bool {
    if href == "/" {
        current == "/"
    } else {
        current == href || current.starts_with(&format!("{}/", href))
    }
}

#[component]
pub fn Sidebar() -> impl IntoView {
    let pathname = use_location().pathname;

    view! {
        <nav class="sidebar">
            <header class="sidebar-header">
                <h1 class="sidebar-title">"NeuroLens"</h1>
                <p class="sidebar-subtitle">"Workflow friction analysis"</p>
            </header>
            <ul class="nav-list">
                {NAV_ITEMS.into_iter().map(|(href, label)| {
                    let active = move || is_active(&pathname.get(), href);
                    view! {
                        <li class="nav-item">
                            <a href=href class="nav-link" class:nav-link-active=active>{label}</a>
                        </li>
                    }
                }).collect_view()}
            </ul>
        </nav>
    }
}
