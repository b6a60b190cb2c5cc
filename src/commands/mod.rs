pub mod actions;
pub mod dashboard;
pub mod invoices;
pub mod mailbox;
pub mod settings;
