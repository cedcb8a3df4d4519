pub mod oauth_service;
pub mod page_parser;
pub mod paste_resolver;
pub mod record_store;
pub mod report;
pub mod upload_service;

pub use oauth_service::{OAuthService, OAuthStage};
pub use page_parser::parse_problem_page;
pub use paste_resolver::PasteResolver;
pub use record_store::{ConfigStore, ProblemStore};
pub use report::render_problem_list;
pub use upload_service::{slugify, submission_path, UploadService};
