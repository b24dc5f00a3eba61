pub mod config;
pub mod explain;
pub mod import;
pub mod repl;
pub mod search;
pub mod status;

pub use explain::run_explain;
pub use import::run_import;
pub use repl::run_repl;
pub use search::run_search;
pub use status::show_status;
