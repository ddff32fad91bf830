pub mod upload;
pub mod url;
