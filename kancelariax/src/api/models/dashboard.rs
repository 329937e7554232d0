//! API response models for the admin dashboard.

use super::law_firms::LawFirm;
use super::users::UserStats;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Firm counts over every firm, including soft-deleted ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LawFirmStats {
    pub total: u64,
    pub active: u64,
    pub new_this_month: u64,
}

impl LawFirmStats {
    pub fn collect(firms: &[LawFirm], now: DateTime<Utc>) -> Self {
        let mut stats = LawFirmStats {
            total: firms.len() as u64,
            ..Default::default()
        };
        for firm in firms {
            if firm.is_active {
                stats.active += 1;
            }
            if firm.created_at.year() == now.year() && firm.created_at.month() == now.month() {
                stats.new_this_month += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: UserStats,
    pub law_firms: LawFirmStats,
}
