pub mod app;
pub mod aws;
pub mod clock;
pub mod command;
pub mod error;
pub mod handler;
pub mod key_age;
pub mod mfa;
pub mod paths;
pub mod profile;
pub mod prompt;
pub mod session;
pub mod store;

pub use awsx_schema::credentials;
