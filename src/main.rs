mod app;
mod browser;
mod commands;
mod components;
mod pages;
mod upload;

use app::App;

fn main() {
    leptos::mount::mount_to_body(App);
}
