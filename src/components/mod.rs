pub mod api_key_form;
pub mod drop_zone;
pub mod report_view;
pub mod sidebar;
pub mod status_badge;
