use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /spin`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinRequest {
    pub player_id: Uuid,
    pub bet: Decimal,
}

/// One row's winning run as it goes over the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WinDto {
    pub symbol: String,
    pub run: Vec<usize>,
}

/// Outcome record of one spin. A declined spin carries only `reason`;
/// a completed spin carries everything else.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_set: Option<BTreeMap<u32, WinDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SpinResponse {
    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            spin_id: None,
            grid: None,
            win_set: None,
            payout: None,
            balance_after: None,
            reason: Some(reason.into()),
        }
    }
}

/// Body of `POST /players`. Omitting the balance provisions the house
/// default.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreatePlayerRequest {
    pub name: String,
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerResponse {
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub total_wagered: Decimal,
    pub total_won: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SymbolDto {
    pub name: String,
    pub payout_multiplier: Decimal,
}

/// Bearer-authenticated catalog upsert (`POST /admin/symbols`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpsertSymbolRequest {
    pub name: String,
    pub payout_multiplier: Decimal,
}

/// One entry of `GET /players/{id}/spins`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinRecord {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub bet_amount: Decimal,
    pub payout: Decimal,
    pub grid: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_set: Option<BTreeMap<u32, WinDto>>,
}
