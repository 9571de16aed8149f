//! Dashboard aggregation.

use super::DataService;
use crate::types::{DashboardStats, Lead, LeadStatus, Product};

/// Stock level below which a product counts as an inventory alert.
const LOW_STOCK_THRESHOLD: u32 = 10;

impl DataService {
    /// Aggregate numbers for the dashboard header, computed over what
    /// `requester` may see. Revenue is the value of won deals; the
    /// conversion rate is won leads over closed leads.
    pub async fn dashboard_stats(&self, requester: Option<&str>) -> DashboardStats {
        let leads: Vec<Lead> = self.fetch(requester).await;
        let products: Vec<Product> = self.fetch(requester).await;

        let total_revenue = leads
            .iter()
            .filter(|l| l.status == LeadStatus::Won)
            .map(|l| l.value)
            .sum();

        let active_leads = leads.iter().filter(|l| !l.status.is_terminal()).count();
        let won = leads.iter().filter(|l| l.status == LeadStatus::Won).count();
        let lost = leads.iter().filter(|l| l.status == LeadStatus::Lost).count();
        let closed = won + lost;
        let conversion_rate = if closed == 0 {
            0.0
        } else {
            won as f64 / closed as f64 * 100.0
        };

        let inventory_alerts = products
            .iter()
            .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
            .count();

        DashboardStats {
            total_revenue,
            active_leads,
            conversion_rate,
            inventory_alerts,
        }
    }
}
