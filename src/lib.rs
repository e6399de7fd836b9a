pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod odoo;
pub mod service;
pub mod template;

pub use config::AppConfig;
pub use db::create_pool;
pub use service::{CategorySync, InvoiceCategoryReconciler, InvoiceCreator, InvoiceRun};
