pub mod api_v1;
pub mod auth_handlers;
pub mod dashboard;
pub mod field_service_handlers;
pub mod form;
pub mod group_handlers;
pub mod import_handlers;
pub mod publisher_handlers;
pub mod schedule_handlers;
pub mod settings_handlers;
pub mod talk_handlers;
pub mod visitor_handlers;
pub mod week_handlers;
