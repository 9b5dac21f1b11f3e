pub mod body;
pub mod errors;
pub mod intercept;
pub mod operation;
pub mod proxy;
pub mod runtime;
pub mod server;
