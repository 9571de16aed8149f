//! Canonical entity records and wire enumerations.
//!
//! Every record type here is backend-agnostic: the same shape is persisted to
//! the local snapshot store, sent to the relational backend, and produced by
//! the record mapper from raw remote rows. Status/category enumerations carry
//! their exact wire string (`"Proposal Sent"`, `"IT Hardware"`, …) so values
//! round-trip byte-for-byte. Values outside the closed sets are preserved in
//! an `Other` variant rather than rejected; see the open question in
//! DESIGN.md.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Entity kinds
// ============================================================================

/// One value per entity collection the data layer manages.
///
/// The `collection()` name doubles as the local snapshot key and the
/// relational backend's table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Leads,
    Products,
    PurchaseOrders,
    Clients,
    Proposals,
    Invoices,
    Tickets,
    FinanceRecords,
    TimesheetEntries,
    AppUsers,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Leads,
        EntityKind::Products,
        EntityKind::PurchaseOrders,
        EntityKind::Clients,
        EntityKind::Proposals,
        EntityKind::Invoices,
        EntityKind::Tickets,
        EntityKind::FinanceRecords,
        EntityKind::TimesheetEntries,
        EntityKind::AppUsers,
    ];

    /// Collection name: local snapshot file stem and remote table name.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Leads => "leads",
            EntityKind::Products => "products",
            EntityKind::PurchaseOrders => "purchase_orders",
            EntityKind::Clients => "clients",
            EntityKind::Proposals => "proposals",
            EntityKind::Invoices => "invoices",
            EntityKind::Tickets => "tickets",
            EntityKind::FinanceRecords => "finance_records",
            EntityKind::TimesheetEntries => "timesheet_entries",
            EntityKind::AppUsers => "app_users",
        }
    }

    /// Reverse of `collection()`. Used by the snapshot watcher to map a
    /// changed file back to its entity kind.
    pub fn from_collection(name: &str) -> Option<EntityKind> {
        EntityKind::ALL.iter().copied().find(|k| k.collection() == name)
    }

    /// Whether records of this kind carry the visibility/owner/share
    /// fields. Scoped reads are filtered, server-side or in memory.
    pub fn is_scoped(&self) -> bool {
        matches!(self, EntityKind::Leads | EntityKind::Products)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

// ============================================================================
// Wire enumerations
// ============================================================================

/// Lead pipeline status. Ordered; `Won` and `Lost` are terminal.
///
/// The string values are the storage/wire representation and must round-trip
/// exactly (`"Proposal Sent"` has a space).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    ProposalSent,
    Won,
    Lost,
    /// Unrecognized backend value, passed through unchanged.
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::ProposalSent => "Proposal Sent",
            LeadStatus::Won => "Won",
            LeadStatus::Lost => "Lost",
            LeadStatus::Other(s) => s,
        }
    }

    /// Next stage on the "advance" path. `Proposal Sent` is the last stage
    /// reachable this way: Won is only entered explicitly and Lost only via
    /// `mark_lead_lost`. Unknown statuses are not advanceable.
    pub fn next(&self) -> Option<LeadStatus> {
        match self {
            LeadStatus::New => Some(LeadStatus::Contacted),
            LeadStatus::Contacted => Some(LeadStatus::Qualified),
            LeadStatus::Qualified => Some(LeadStatus::ProposalSent),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "New" => LeadStatus::New,
            "Contacted" => LeadStatus::Contacted,
            "Qualified" => LeadStatus::Qualified,
            "Proposal Sent" => LeadStatus::ProposalSent,
            "Won" => LeadStatus::Won,
            "Lost" => LeadStatus::Lost,
            _ => LeadStatus::Other(s),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(s: LeadStatus) -> Self {
        s.as_str().to_string()
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductCategory {
    Stationery,
    ItHardware,
    Software,
    OfficeFurniture,
    Other(String),
}

impl ProductCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ProductCategory::Stationery => "Stationery",
            ProductCategory::ItHardware => "IT Hardware",
            ProductCategory::Software => "Software",
            ProductCategory::OfficeFurniture => "Office Furniture",
            ProductCategory::Other(s) => s,
        }
    }
}

impl From<String> for ProductCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Stationery" => ProductCategory::Stationery,
            "IT Hardware" => ProductCategory::ItHardware,
            "Software" => ProductCategory::Software,
            "Office Furniture" => ProductCategory::OfficeFurniture,
            _ => ProductCategory::Other(s),
        }
    }
}

impl From<ProductCategory> for String {
    fn from(c: ProductCategory) -> Self {
        c.as_str().to_string()
    }
}

impl Default for ProductCategory {
    fn default() -> Self {
        ProductCategory::Stationery
    }
}

/// Purchase order fulfilment stage. Ordered; terminal at `Reached`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PurchaseOrderStatus {
    Needed,
    Ordered,
    Transit,
    Reached,
    Other(String),
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PurchaseOrderStatus::Needed => "Product Needed",
            PurchaseOrderStatus::Ordered => "Order Given",
            PurchaseOrderStatus::Transit => "Items on the way",
            PurchaseOrderStatus::Reached => "Items Reached",
            PurchaseOrderStatus::Other(s) => s,
        }
    }

    /// Next fulfilment stage, or None once the items have arrived (or the
    /// current value is unrecognized).
    pub fn next(&self) -> Option<PurchaseOrderStatus> {
        match self {
            PurchaseOrderStatus::Needed => Some(PurchaseOrderStatus::Ordered),
            PurchaseOrderStatus::Ordered => Some(PurchaseOrderStatus::Transit),
            PurchaseOrderStatus::Transit => Some(PurchaseOrderStatus::Reached),
            _ => None,
        }
    }
}

impl From<String> for PurchaseOrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Product Needed" => PurchaseOrderStatus::Needed,
            "Order Given" => PurchaseOrderStatus::Ordered,
            "Items on the way" => PurchaseOrderStatus::Transit,
            "Items Reached" => PurchaseOrderStatus::Reached,
            _ => PurchaseOrderStatus::Other(s),
        }
    }
}

impl From<PurchaseOrderStatus> for String {
    fn from(s: PurchaseOrderStatus) -> Self {
        s.as_str().to_string()
    }
}

impl Default for PurchaseOrderStatus {
    fn default() -> Self {
        PurchaseOrderStatus::Needed
    }
}

/// Invoice lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Other(String),
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Other(s) => s,
        }
    }
}

impl From<String> for InvoiceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Draft" => InvoiceStatus::Draft,
            "Sent" => InvoiceStatus::Sent,
            "Paid" => InvoiceStatus::Paid,
            "Overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Other(s),
        }
    }
}

impl From<InvoiceStatus> for String {
    fn from(s: InvoiceStatus) -> Self {
        s.as_str().to_string()
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

/// Support ticket status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Other(String),
}

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Other(s) => s,
        }
    }
}

impl From<String> for TicketStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Open" => TicketStatus::Open,
            "In Progress" => TicketStatus::InProgress,
            "Resolved" => TicketStatus::Resolved,
            _ => TicketStatus::Other(s),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(s: TicketStatus) -> Self {
        s.as_str().to_string()
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Open
    }
}

/// Access scope on a shared record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Private,
    Shared,
    Other(String),
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Shared => "shared",
            Visibility::Other(s) => s,
        }
    }
}

impl From<String> for Visibility {
    fn from(s: String) -> Self {
        match s.as_str() {
            "public" => Visibility::Public,
            "private" => Visibility::Private,
            "shared" => Visibility::Shared,
            _ => Visibility::Other(s),
        }
    }
}

impl From<Visibility> for String {
    fn from(v: Visibility) -> Self {
        v.as_str().to_string()
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

// ============================================================================
// Access scope
// ============================================================================

/// Borrowed view of a record's access-control fields.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub visibility: &'a Visibility,
    pub owner_id: &'a str,
    pub shared_with: &'a [String],
}

impl Scope<'_> {
    /// A record is visible iff it is public, the requester owns it, or the
    /// requester appears in its share list. Unrecognized visibility values
    /// grant nothing beyond the owner path.
    pub fn visible_to(&self, requester: Option<&str>) -> bool {
        if *self.visibility == Visibility::Public {
            return true;
        }
        match requester {
            Some(user) => {
                self.owner_id == user || self.shared_with.iter().any(|u| u == user)
            }
            None => false,
        }
    }
}

// ============================================================================
// Record trait
// ============================================================================

/// Common surface every entity record exposes to the data layer.
///
/// `from_row` ties in the record mapper: it never fails, producing a
/// best-effort record from an arbitrary remote row.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn assign_id(&mut self, id: String);

    /// Normalize a raw backend row into this record shape.
    fn from_row(row: &serde_json::Value) -> Self;

    /// Access-control fields, for visibility-scoped entities only.
    fn scope(&self) -> Option<Scope<'_>> {
        None
    }

    fn visible_to(&self, requester: Option<&str>) -> bool {
        match self.scope() {
            Some(scope) => scope.visible_to(requester),
            None => true,
        }
    }
}

// ============================================================================
// Entity records
// ============================================================================

/// A sales lead moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: LeadStatus,
    /// Deal value in the catalog currency. Non-negative.
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub last_contact: String,
    /// Free-text interest tags; order irrelevant.
    #[serde(default)]
    pub interest: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// User ids the record is shared with. Meaningful only when
    /// visibility is `shared`.
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub owner_id: String,
}

impl Record for Lead {
    const KIND: EntityKind = EntityKind::Leads;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::lead_from_row(row)
    }

    fn scope(&self) -> Option<Scope<'_>> {
        Some(Scope {
            visibility: &self.visibility,
            owner_id: &self.owner_id,
            shared_with: &self.shared_with,
        })
    }
}

/// A catalog product with stock tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: ProductCategory,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    /// Unique per catalog by convention; uniqueness is not enforced here.
    #[serde(default)]
    pub sku: String,
    /// Products are two-state (public/private); `shared` is never produced
    /// by the UI but tolerated by the mapper.
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub owner_id: String,
}

impl Record for Product {
    const KIND: EntityKind = EntityKind::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::product_from_row(row)
    }

    fn scope(&self) -> Option<Scope<'_>> {
        Some(Scope {
            visibility: &self.visibility,
            owner_id: &self.owner_id,
            shared_with: &[],
        })
    }
}

/// A vendor purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub item_name: String,
    #[serde(default)]
    pub vendor: String,
    /// At least 1.
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub notes: String,
}

impl Record for PurchaseOrder {
    const KIND: EntityKind = EntityKind::PurchaseOrders;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::purchase_order_from_row(row)
    }
}

/// A billing client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(default)]
    pub address: String,
    /// "Active" or "Inactive".
    #[serde(default)]
    pub status: String,
}

impl Record for Client {
    const KIND: EntityKind = EntityKind::Clients;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::client_from_row(row)
    }
}

/// A sales proposal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub title: String,
    /// Denormalized client reference, not a join.
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// "Draft", "Sent", "Accepted" or "Rejected".
    #[serde(default)]
    pub status: String,
}

impl Record for Proposal {
    const KIND: EntityKind = EntityKind::Proposals;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::proposal_from_row(row)
    }
}

/// One line item on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hsn: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub rate: f64,
    /// GST percentage, e.g. 18.
    #[serde(default)]
    pub gst_rate: f64,
}

/// A tax invoice or proforma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_gstin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    /// Total including tax.
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// "Invoice" or "Proforma".
    #[serde(default, rename = "type")]
    pub invoice_type: String,
}

impl Record for Invoice {
    const KIND: EntityKind = EntityKind::Invoices;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::invoice_from_row(row)
    }
}

/// A comment on a support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub client_name: String,
    /// "Low", "Medium" or "High".
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub comments: Vec<TicketComment>,
}

impl Record for Ticket {
    const KIND: EntityKind = EntityKind::Tickets;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::ticket_from_row(row)
    }
}

/// An income or expense ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRecord {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    /// "Income" or "Expense".
    #[serde(default, rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

impl Record for FinanceRecord {
    const KIND: EntityKind = EntityKind::FinanceRecords;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::finance_record_from_row(row)
    }
}

/// A logged block of work time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Record for TimesheetEntry {
    const KIND: EntityKind = EntityKind::TimesheetEntries;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::timesheet_entry_from_row(row)
    }
}

/// An application user account (directory record, not a session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// "Admin" or "Employee".
    #[serde(default)]
    pub role: String,
    /// "Active" or "Inactive".
    #[serde(default)]
    pub status: String,
}

impl Record for AppUser {
    const KIND: EntityKind = EntityKind::AppUsers;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_row(row: &serde_json::Value) -> Self {
        crate::mapper::app_user_from_row(row)
    }
}

/// Aggregate numbers for the dashboard header cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub active_leads: usize,
    /// Won / (won + lost), as a percentage. 0 when nothing is closed yet.
    pub conversion_rate: f64,
    pub inventory_alerts: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_status_wire_roundtrip() {
        for (status, wire) in [
            (LeadStatus::New, "\"New\""),
            (LeadStatus::ProposalSent, "\"Proposal Sent\""),
            (LeadStatus::Won, "\"Won\""),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, wire);
            let back: LeadStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_lead_status_unknown_passes_through() {
        let status: LeadStatus = serde_json::from_str("\"Archived\"").unwrap();
        assert_eq!(status, LeadStatus::Other("Archived".to_string()));
        // And it round-trips back out unchanged.
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Archived\"");
        assert!(status.next().is_none());
    }

    #[test]
    fn test_lead_status_advance_stops_before_won() {
        let mut status = LeadStatus::New;
        let mut hops = 0;
        while let Some(next) = status.next() {
            status = next;
            hops += 1;
        }
        assert_eq!(hops, 3);
        assert_eq!(status, LeadStatus::ProposalSent);
    }

    #[test]
    fn test_purchase_order_status_wire_values() {
        assert_eq!(PurchaseOrderStatus::Needed.as_str(), "Product Needed");
        assert_eq!(PurchaseOrderStatus::Ordered.as_str(), "Order Given");
        assert_eq!(PurchaseOrderStatus::Transit.as_str(), "Items on the way");
        assert_eq!(PurchaseOrderStatus::Reached.as_str(), "Items Reached");
        assert!(PurchaseOrderStatus::Reached.next().is_none());
    }

    #[test]
    fn test_product_category_wire_values() {
        let cat: ProductCategory = serde_json::from_str("\"IT Hardware\"").unwrap();
        assert_eq!(cat, ProductCategory::ItHardware);
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"IT Hardware\"");
    }

    #[test]
    fn test_scope_visibility_rules() {
        let shared_with = vec!["u2".to_string()];
        let scope = Scope {
            visibility: &Visibility::Shared,
            owner_id: "u1",
            shared_with: &shared_with,
        };
        assert!(scope.visible_to(Some("u1")));
        assert!(scope.visible_to(Some("u2")));
        assert!(!scope.visible_to(Some("u3")));
        assert!(!scope.visible_to(None));

        let public = Scope {
            visibility: &Visibility::Public,
            owner_id: "",
            shared_with: &[],
        };
        assert!(public.visible_to(None));
    }

    #[test]
    fn test_unknown_visibility_grants_owner_only() {
        let scope = Scope {
            visibility: &Visibility::Other("internal".to_string()),
            owner_id: "u1",
            shared_with: &[],
        };
        assert!(scope.visible_to(Some("u1")));
        assert!(!scope.visible_to(Some("u2")));
        assert!(!scope.visible_to(None));
    }

    #[test]
    fn test_lead_serializes_camel_case() {
        let lead = Lead {
            id: "l1".to_string(),
            name: "Asha".to_string(),
            company: "Mehta Traders".to_string(),
            email: String::new(),
            phone: String::new(),
            state: "Gujarat".to_string(),
            status: LeadStatus::Qualified,
            value: 45000.0,
            notes: String::new(),
            last_contact: "2024-03-01".to_string(),
            interest: vec!["Software".to_string()],
            visibility: Visibility::Shared,
            shared_with: vec!["u2".to_string()],
            owner_id: "u1".to_string(),
        };
        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["ownerId"], "u1");
        assert_eq!(json["sharedWith"][0], "u2");
        assert_eq!(json["lastContact"], "2024-03-01");
        assert_eq!(json["status"], "Qualified");
    }

    #[test]
    fn test_entity_kind_collection_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_collection(kind.collection()), Some(kind));
        }
        assert_eq!(EntityKind::from_collection("unknown"), None);
    }

    #[test]
    fn test_only_sharing_entities_are_scoped() {
        assert!(EntityKind::Leads.is_scoped());
        assert!(EntityKind::Products.is_scoped());
        assert!(!EntityKind::Clients.is_scoped());
        assert!(!EntityKind::Invoices.is_scoped());
    }
}
