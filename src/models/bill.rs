use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_CODE_AUTOPAY, STATUS_CODE_PAID, STATUS_CODE_PENDING};

// ==================== BILL ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillStatus {
    Pending,
    Paid,
    #[serde(rename = "AutoPay Enabled")]
    AutoPayEnabled,
}

impl BillStatus {
    /// Maps an on-chain status code. Anything unrecognised reads as pending.
    pub fn from_code(code: u64) -> Self {
        match code {
            1 => BillStatus::Paid,
            2 => BillStatus::AutoPayEnabled,
            _ => BillStatus::Pending,
        }
    }

    /// Same as [`BillStatus::from_code`] for a raw JSON field, which Aptos
    /// may hand back as a number or a decimal string.
    pub fn from_value(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(crate::bills::units::parse_u64_value)
            .map(Self::from_code)
            .unwrap_or(BillStatus::Pending)
    }

    pub fn code(self) -> u8 {
        match self {
            BillStatus::Pending => STATUS_CODE_PENDING,
            BillStatus::Paid => STATUS_CODE_PAID,
            BillStatus::AutoPayEnabled => STATUS_CODE_AUTOPAY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BillStatus::Pending => "Pending",
            BillStatus::Paid => "Paid",
            BillStatus::AutoPayEnabled => "AutoPay Enabled",
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub service: String,
    pub due_date: String, // YYYY-MM-DD
    pub amount: f64,
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
}

// ==================== AUTOPAY ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPayConfig {
    pub bill_id: String,
    /// Day of month, 1..=31.
    #[serde(default)]
    pub payment_date: u8,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub max_amount: f64,
    pub enabled: bool,
}

impl AutoPayConfig {
    /// Config assumed for an AutoPay bill that has nothing cached: first of
    /// the month, monthly, capped at the bill amount.
    pub fn fallback_for(bill: &Bill) -> Self {
        Self {
            bill_id: bill.id.clone(),
            payment_date: 1,
            frequency: Frequency::Monthly,
            max_amount: bill.amount,
            enabled: true,
        }
    }

    /// Fills the modal's fallbacks (first of the month, ceiling at the bill
    /// amount) and rejects values the contract flow cannot honour.
    pub fn normalized_for(mut self, bill_amount: f64) -> crate::error::Result<Self> {
        if self.payment_date == 0 {
            self.payment_date = 1;
        }
        if self.max_amount == 0.0 {
            self.max_amount = bill_amount;
        }
        if self.payment_date > 31 {
            return Err(crate::error::AppError::BadRequest(format!(
                "Payment date must be between 1 and 31, got {}",
                self.payment_date
            )));
        }
        if !self.max_amount.is_finite() || self.max_amount < 0.0 {
            return Err(crate::error::AppError::BadRequest(
                "Max amount must be a non-negative number".to_string(),
            ));
        }
        if self.bill_id.trim().is_empty() {
            return Err(crate::error::AppError::BadRequest(
                "Bill id is required".to_string(),
            ));
        }
        Ok(self)
    }
}

// ==================== ADD BILL FORM ====================
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBillForm {
    pub amount: f64,
    pub description: String,
    /// Payee address.
    pub address: String,
    #[serde(default)]
    pub due_date: Option<String>,
}
