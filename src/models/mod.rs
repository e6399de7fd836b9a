pub mod category;
pub mod odoo;
pub mod report;

pub use category::Category;
pub use odoo::{CompositeId, Invoice, InvoiceCategory, InvoiceLine, Partner};
pub use report::{BillingCategory, BillingInvoice, Item, ProductRef, SubItem, Tenant};
