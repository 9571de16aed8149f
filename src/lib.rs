//! Data access and synchronization layer for the Ravechi CRM.
//!
//! `DataService` is the facade pages talk to: typed CRUD per entity, status
//! transitions, dashboard aggregation and change subscriptions. Behind it
//! sit a local JSON snapshot store (the write-through mirror and offline
//! source of truth), one of two remote backends chosen at boot, and the
//! change plumbing that keeps subscribers, other processes, and the backend
//! push feed in sync.

pub mod config;
pub mod data;
pub mod error;
pub mod mapper;
pub mod notifier;
pub mod optimistic;
pub mod remote;
pub mod store;
pub mod types;
pub mod watcher;

pub use config::{BackendConfig, DocumentSettings, RelationalSettings};
pub use data::{DataService, Listeners};
pub use error::DataError;
pub use notifier::{ChangeNotifier, Subscription};
pub use optimistic::with_optimistic_update;
pub use store::LocalStore;
pub use types::{
    AppUser, Client, DashboardStats, EntityKind, FinanceRecord, Invoice, InvoiceItem,
    InvoiceStatus, Lead, LeadStatus, Product, ProductCategory, Proposal, PurchaseOrder,
    PurchaseOrderStatus, Record, Ticket, TicketComment, TicketStatus, TimesheetEntry, Visibility,
};
