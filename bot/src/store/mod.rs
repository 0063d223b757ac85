pub mod groups;
pub mod headers;
pub mod json_file;
pub mod models;

pub use groups::GroupStore;
pub use headers::HeaderStore;
pub use json_file::StoreError;
