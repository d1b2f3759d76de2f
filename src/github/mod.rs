pub mod branches;
pub mod client;
pub mod errors;
pub mod issues;
pub mod notify;

pub use client::GitHubClient;
pub use errors::GitHubError;
