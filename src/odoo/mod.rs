//! Odoo ERP 访问层
//!
//! [`ErpClient`] 是外部协作方接口 (search/create/update/delete/invoke),
//! [`OdooSession`] 是基于 JSON-RPC 的实现, [`Odoo`] 在其之上提供强类型模型操作。

pub mod client;
pub mod jsonrpc;
pub mod model;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ErpClient, Filter, OdooClient, OdooSession, Session};
pub use model::{Lookup, Odoo};
