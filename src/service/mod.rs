pub mod invoice;
pub mod invoice_run;
pub mod reconciler;
pub mod sync;

pub use invoice::{InvoiceCreator, InvoiceDefaults, InvoiceOptions};
pub use invoice_run::InvoiceRun;
pub use reconciler::{InvoiceCategoryReconciler, StaticZoneMapper, ZoneNameMapper};
pub use sync::{CategorySync, SyncStats};
