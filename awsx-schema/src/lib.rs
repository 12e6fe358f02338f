pub mod credentials;
pub mod shell;
