//! Record mapper: raw backend rows to canonical records.
//!
//! Remote rows arrive as untyped JSON with inconsistent key casing: the
//! relational backend stores snake_case columns, the document backend and the
//! local snapshot use the camelCase wire shape. Each field is therefore read
//! through an ordered candidate-key list (camelCase first, then snake_case).
//!
//! The mapper never fails: absent strings default to empty, numerics coerce
//! safely to 0, missing or non-array sets become empty, and enumeration
//! values outside the closed set pass through unchanged (see the open
//! question in DESIGN.md). A malformed row becomes a best-effort record,
//! never an error.

use serde_json::Value;

use crate::types::{
    AppUser, Client, FinanceRecord, Invoice, InvoiceItem, InvoiceStatus, Lead, LeadStatus,
    Product, ProductCategory, Proposal, PurchaseOrder, PurchaseOrderStatus, Ticket,
    TicketComment, TicketStatus, TimesheetEntry, Visibility,
};

// ============================================================================
// Field coercion helpers
// ============================================================================

/// First value found under any of the candidate keys, in order.
fn field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        match row.get(key) {
            Some(Value::Null) | None => continue,
            Some(v) => return Some(v),
        }
    }
    None
}

/// String field; absent, null, or non-string values become "".
/// Bare numbers are stringified (backends sometimes return numeric ids).
fn text(row: &Value, keys: &[&str]) -> String {
    match field(row, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Optional string field; "" and absent both map to None.
fn opt_text(row: &Value, keys: &[&str]) -> Option<String> {
    let s = text(row, keys);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Numeric field with safe coercion: numbers pass through, numeric strings
/// parse, everything else is 0.
fn number(row: &Value, keys: &[&str]) -> f64 {
    match field(row, keys) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Non-negative integer field. Negative or fractional values clamp to 0.
fn count(row: &Value, keys: &[&str]) -> u32 {
    let n = number(row, keys);
    if n.is_finite() && n >= 0.0 {
        n as u32
    } else {
        0
    }
}

/// String-array field; absent or non-array values become empty. Non-string
/// elements inside an array are skipped.
fn text_list(row: &Value, keys: &[&str]) -> Vec<String> {
    match field(row, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Enumeration field routed through the type's `From<String>`, which carries
/// unrecognized values in its `Other` variant.
fn coerce<T: From<String> + Default>(row: &Value, keys: &[&str]) -> T {
    match field(row, keys).and_then(Value::as_str) {
        Some(s) => T::from(s.to_string()),
        None => T::default(),
    }
}

// ============================================================================
// Per-entity mappers
// ============================================================================

pub fn lead_from_row(row: &Value) -> Lead {
    Lead {
        id: text(row, &["id"]),
        name: text(row, &["name"]),
        company: text(row, &["company"]),
        email: text(row, &["email"]),
        phone: text(row, &["phone"]),
        state: text(row, &["state"]),
        status: coerce::<LeadStatus>(row, &["status"]),
        value: number(row, &["value"]),
        notes: text(row, &["notes"]),
        last_contact: text(row, &["lastContact", "last_contact"]),
        interest: text_list(row, &["interest"]),
        visibility: coerce::<Visibility>(row, &["visibility"]),
        shared_with: text_list(row, &["sharedWith", "shared_with"]),
        owner_id: text(row, &["ownerId", "owner_id"]),
    }
}

pub fn product_from_row(row: &Value) -> Product {
    Product {
        id: text(row, &["id"]),
        name: text(row, &["name"]),
        category: coerce::<ProductCategory>(row, &["category"]),
        price: number(row, &["price"]),
        stock: count(row, &["stock"]),
        sku: text(row, &["sku"]),
        visibility: coerce::<Visibility>(row, &["visibility"]),
        owner_id: text(row, &["ownerId", "owner_id"]),
    }
}

pub fn purchase_order_from_row(row: &Value) -> PurchaseOrder {
    PurchaseOrder {
        id: text(row, &["id"]),
        item_name: text(row, &["itemName", "item_name"]),
        vendor: text(row, &["vendor"]),
        quantity: count(row, &["quantity"]).max(1),
        estimated_cost: number(row, &["estimatedCost", "estimated_cost"]),
        status: coerce::<PurchaseOrderStatus>(row, &["status"]),
        order_date: text(row, &["orderDate", "order_date"]),
        notes: text(row, &["notes"]),
    }
}

pub fn client_from_row(row: &Value) -> Client {
    Client {
        id: text(row, &["id"]),
        name: text(row, &["name"]),
        company: text(row, &["company"]),
        email: text(row, &["email"]),
        phone: text(row, &["phone"]),
        gstin: opt_text(row, &["gstin"]),
        address: text(row, &["address"]),
        status: text(row, &["status"]),
    }
}

pub fn proposal_from_row(row: &Value) -> Proposal {
    Proposal {
        id: text(row, &["id"]),
        title: text(row, &["title"]),
        client_name: text(row, &["clientName", "client_name"]),
        value: number(row, &["value"]),
        date: text(row, &["date"]),
        valid_until: opt_text(row, &["validUntil", "valid_until"]),
        description: opt_text(row, &["description"]),
        status: text(row, &["status"]),
    }
}

fn invoice_item_from_row(row: &Value) -> InvoiceItem {
    InvoiceItem {
        id: text(row, &["id"]),
        description: text(row, &["description"]),
        hsn: text(row, &["hsn"]),
        quantity: number(row, &["quantity"]),
        rate: number(row, &["rate"]),
        gst_rate: number(row, &["gstRate", "gst_rate"]),
    }
}

pub fn invoice_from_row(row: &Value) -> Invoice {
    let items = match field(row, &["items"]) {
        Some(Value::Array(items)) => items.iter().map(invoice_item_from_row).collect(),
        _ => Vec::new(),
    };
    Invoice {
        id: text(row, &["id"]),
        number: text(row, &["number"]),
        client_name: text(row, &["clientName", "client_name"]),
        client_gstin: opt_text(row, &["clientGstin", "client_gstin"]),
        client_address: opt_text(row, &["clientAddress", "client_address"]),
        date: text(row, &["date"]),
        due_date: text(row, &["dueDate", "due_date"]),
        items,
        amount: number(row, &["amount"]),
        status: coerce::<InvoiceStatus>(row, &["status"]),
        invoice_type: text(row, &["type", "invoice_type"]),
    }
}

fn ticket_comment_from_row(row: &Value) -> TicketComment {
    TicketComment {
        id: text(row, &["id"]),
        text: text(row, &["text"]),
        author: text(row, &["author"]),
        date: text(row, &["date"]),
    }
}

pub fn ticket_from_row(row: &Value) -> Ticket {
    let comments = match field(row, &["comments"]) {
        Some(Value::Array(items)) => items.iter().map(ticket_comment_from_row).collect(),
        _ => Vec::new(),
    };
    Ticket {
        id: text(row, &["id"]),
        subject: text(row, &["subject"]),
        client_name: text(row, &["clientName", "client_name"]),
        priority: text(row, &["priority"]),
        status: coerce::<TicketStatus>(row, &["status"]),
        date: text(row, &["date"]),
        comments,
    }
}

pub fn finance_record_from_row(row: &Value) -> FinanceRecord {
    FinanceRecord {
        id: text(row, &["id"]),
        description: text(row, &["description"]),
        amount: number(row, &["amount"]),
        record_type: text(row, &["type", "record_type"]),
        category: text(row, &["category"]),
        date: text(row, &["date"]),
    }
}

pub fn timesheet_entry_from_row(row: &Value) -> TimesheetEntry {
    TimesheetEntry {
        id: text(row, &["id"]),
        project: text(row, &["project"]),
        task: text(row, &["task"]),
        hours: number(row, &["hours"]),
        date: text(row, &["date"]),
        start_time: opt_text(row, &["startTime", "start_time"]),
        end_time: opt_text(row, &["endTime", "end_time"]),
    }
}

pub fn app_user_from_row(row: &Value) -> AppUser {
    AppUser {
        id: text(row, &["id"]),
        name: text(row, &["name"]),
        email: text(row, &["email"]),
        role: text(row, &["role"]),
        status: text(row, &["status"]),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_snake_case_columns() {
        // Shape the relational backend returns.
        let row = json!({
            "id": "l1",
            "name": "Asha",
            "company": "Mehta Traders",
            "status": "Proposal Sent",
            "value": 45000,
            "owner_id": "u1",
            "shared_with": ["u2", "u3"],
            "last_contact": "2024-03-01",
            "visibility": "shared"
        });
        let lead = lead_from_row(&row);
        assert_eq!(lead.owner_id, "u1");
        assert_eq!(lead.shared_with, vec!["u2", "u3"]);
        assert_eq!(lead.last_contact, "2024-03-01");
        assert_eq!(lead.status, LeadStatus::ProposalSent);
        assert_eq!(lead.visibility, Visibility::Shared);
    }

    #[test]
    fn test_lead_camel_case_wins_over_snake_case() {
        let row = json!({
            "id": "l1",
            "ownerId": "camel",
            "owner_id": "snake"
        });
        assert_eq!(lead_from_row(&row).owner_id, "camel");
    }

    #[test]
    fn test_lead_malformed_row_defaults() {
        let row = json!({
            "id": 42,
            "value": "not-a-number",
            "interest": "Software",
            "sharedWith": [1, "u2", null]
        });
        let lead = lead_from_row(&row);
        assert_eq!(lead.id, "42");
        assert_eq!(lead.value, 0.0);
        assert!(lead.interest.is_empty());
        assert_eq!(lead.shared_with, vec!["u2"]);
        assert_eq!(lead.email, "");
        assert_eq!(lead.notes, "");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.visibility, Visibility::Public);
    }

    #[test]
    fn test_unknown_status_passes_through() {
        let row = json!({"id": "l1", "status": "On Hold"});
        let lead = lead_from_row(&row);
        assert_eq!(lead.status, LeadStatus::Other("On Hold".to_string()));
        // Re-serializing keeps the original wire value.
        let out = serde_json::to_value(&lead).unwrap();
        assert_eq!(out["status"], "On Hold");
    }

    #[test]
    fn test_product_numeric_string_coercion() {
        let row = json!({
            "id": "p1",
            "name": "Stapler",
            "price": "249.50",
            "stock": "12",
            "category": "Stationery"
        });
        let product = product_from_row(&row);
        assert_eq!(product.price, 249.5);
        assert_eq!(product.stock, 12);
        assert_eq!(product.category, ProductCategory::Stationery);
    }

    #[test]
    fn test_product_negative_stock_clamps() {
        let row = json!({"id": "p1", "stock": -4});
        assert_eq!(product_from_row(&row).stock, 0);
    }

    #[test]
    fn test_purchase_order_quantity_floor() {
        let row = json!({"id": "po1", "item_name": "Toner"});
        let po = purchase_order_from_row(&row);
        assert_eq!(po.quantity, 1);
        assert_eq!(po.item_name, "Toner");
        assert_eq!(po.status, PurchaseOrderStatus::Needed);
    }

    #[test]
    fn test_invoice_nested_items() {
        let row = json!({
            "id": "inv1",
            "number": "RV-0042",
            "client_name": "Mehta Traders",
            "due_date": "2024-04-15",
            "items": [
                {"id": "i1", "description": "Desks", "quantity": 4, "rate": 5200, "gst_rate": 18},
                "garbage"
            ],
            "amount": 24544,
            "status": "Sent",
            "type": "Invoice"
        });
        let invoice = invoice_from_row(&row);
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[0].gst_rate, 18.0);
        // The garbage element degrades to an all-default item, not an error.
        assert_eq!(invoice.items[1].description, "");
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.invoice_type, "Invoice");
    }

    #[test]
    fn test_ticket_comments_default_empty() {
        let row = json!({"id": "t1", "subject": "Printer down", "status": "In Progress"});
        let ticket = ticket_from_row(&row);
        assert!(ticket.comments.is_empty());
        assert_eq!(ticket.status, TicketStatus::InProgress);
    }

    #[test]
    fn test_empty_optional_maps_to_none() {
        let row = json!({"id": "c1", "name": "Ravi", "gstin": ""});
        assert_eq!(client_from_row(&row).gstin, None);
        let row = json!({"id": "c2", "name": "Ravi", "gstin": "24AAACC1206D1ZM"});
        assert_eq!(
            client_from_row(&row).gstin.as_deref(),
            Some("24AAACC1206D1ZM")
        );
    }
}
