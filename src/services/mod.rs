pub mod issues;
pub mod nocodb;
pub mod state;
pub mod store;
pub mod webhook;
