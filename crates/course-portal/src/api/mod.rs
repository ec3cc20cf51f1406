//! API module - HTTP route handlers

pub mod chat_api;
pub mod discussion_api;
pub mod files_api;
pub mod pages_api;
pub mod upload_api;

pub use chat_api::receive;
pub use discussion_api::submit_discussion;
pub use files_api::{delete_file, download_file, rename_file, rename_form, serve_file};
pub use pages_api::{additional_resources, course_content, course_description, index, teaching_staff};
pub use upload_api::{upload, upload_form};
