pub mod commands;
pub mod cooldown;
pub mod error;
pub mod retry;
pub mod validator;
