use leptos::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    /// Optional item that is simply not in use
    Off,
}

impl CheckStatus {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }
}

#[component]
pub fn StatusBadge(
    /// The label text, e.g. "Gemini API Key"
    #[prop(into)]
    label: String,
    status: CheckStatus,
    /// Optional detail text, e.g. where the key came from
    #[prop(optional, into)]
    detail: Option<String>,
) -> impl IntoView {
    let (icon, class) = match status {
        CheckStatus::Pass => ("\u{2713}", "status-badge status-pass"),
        CheckStatus::Fail => ("\u{2717}", "status-badge status-fail"),
        CheckStatus::Off => ("-", "status-badge status-unknown"),
    };

    view! {
        <div class="health-item">
            <span class=class>{icon}</span>
            <span class="health-name">{label}</span>
            <span class="health-detail">{detail.unwrap_or_default()}</span>
        </div>
    }
}
