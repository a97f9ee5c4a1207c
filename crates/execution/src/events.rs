//! Events emitted after committed pool operations.

use amm_domain::token::{Coin, Coins, amount_serde};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Which side of a trade the caller fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExactDirection {
    /// The input amount was exact.
    Input,
    /// The output amount was exact.
    Output,
}

impl fmt::Display for ExactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExactDirection::Input => f.write_str("input"),
            ExactDirection::Output => f.write_str("output"),
        }
    }
}

/// An event emitted by the pool manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Block time of the operation.
    pub block_time: DateTime<Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl SwapEvent {
    pub fn new(block_time: DateTime<Utc>, data: EventData) -> Self {
        Self { block_time, data }
    }

    /// Event type name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.data {
            EventData::Deposit(_) => "swap_deposit",
            EventData::Withdraw(_) => "swap_withdraw",
            EventData::Trade(_) => "swap_trade",
        }
    }

    /// Pool the event belongs to.
    #[must_use]
    pub fn pool_id(&self) -> &str {
        match &self.data {
            EventData::Deposit(d) => &d.pool_id,
            EventData::Withdraw(d) => &d.pool_id,
            EventData::Trade(d) => &d.pool_id,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    Deposit(DepositData),
    Withdraw(WithdrawData),
    Trade(TradeData),
}

/// Data for a deposit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositData {
    pub pool_id: String,
    pub depositor: String,
    /// Coins actually deposited.
    pub amount: Coins,
    /// Shares minted.
    #[serde(with = "amount_serde")]
    pub shares: U256,
}

/// Data for a withdraw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawData {
    pub pool_id: String,
    pub owner: String,
    /// Coins paid out.
    pub amount: Coins,
    /// Shares burned.
    #[serde(with = "amount_serde")]
    pub shares: U256,
}

/// Data for a trade event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeData {
    pub pool_id: String,
    pub requester: String,
    pub input: Coin,
    pub output: Coin,
    /// Fee charged, in the input denomination.
    pub fee_paid: Coin,
    pub exact_direction: ExactDirection,
}

/// Receives events of committed operations.
pub trait EventSink {
    fn emit(&mut self, event: SwapEvent);
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Vec<SwapEvent>,
}

impl MemoryEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[SwapEvent] {
        &self.events
    }

    /// Removes and returns every recorded event.
    pub fn take(&mut self) -> Vec<SwapEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&mut self, event: SwapEvent) {
        self.events.push(event);
    }
}

/// Writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: SwapEvent) {
        match &event.data {
            EventData::Deposit(d) => info!(
                pool_id = %d.pool_id,
                depositor = %d.depositor,
                amount = %d.amount,
                shares = %d.shares,
                "swap_deposit"
            ),
            EventData::Withdraw(d) => info!(
                pool_id = %d.pool_id,
                owner = %d.owner,
                amount = %d.amount,
                shares = %d.shares,
                "swap_withdraw"
            ),
            EventData::Trade(d) => info!(
                pool_id = %d.pool_id,
                requester = %d.requester,
                input = %d.input,
                output = %d.output,
                fee_paid = %d.fee_paid,
                exact = %d.exact_direction,
                "swap_trade"
            ),
        }
    }
}
