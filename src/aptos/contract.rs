use std::sync::Arc;

use serde_json::{json, Value};

use super::{client::BillLedger, payloads, payloads::EntryFunctionPayload};
use crate::{
    bills::units::parse_u64_value,
    config::Config,
    error::{AppError, Result},
};

/// Typed access to the bill-payment Move module.
#[derive(Clone)]
pub struct BillContract {
    ledger: Arc<dyn BillLedger>,
    module_address: Option<String>,
    module_name: String,
}

fn first_u64(result: &[Value], function: &str) -> Result<u64> {
    nth_u64(result, 0, function)
}

fn nth_u64(result: &[Value], n: usize, function: &str) -> Result<u64> {
    result
        .get(n)
        .and_then(parse_u64_value)
        .ok_or_else(|| AppError::BlockchainRPC(format!("unexpected {} result: {:?}", function, result)))
}

impl BillContract {
    pub fn new(ledger: Arc<dyn BillLedger>, config: &Config) -> Self {
        Self {
            ledger,
            module_address: config.module_address.clone(),
            module_name: config.module_name.clone(),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn BillLedger> {
        &self.ledger
    }

    pub fn is_configured(&self) -> bool {
        self.module_address.is_some()
    }

    pub fn function(&self, name: &str) -> Result<String> {
        let address = self
            .module_address
            .as_deref()
            .ok_or(AppError::ContractNotConfigured)?;
        Ok(format!("{}::{}::{}", address, self.module_name, name))
    }

    async fn view(&self, name: &str, arguments: Vec<Value>) -> Result<Vec<Value>> {
        let function = self.function(name)?;
        self.ledger.view(&function, arguments).await
    }

    /// Raw view result; element 0 holds the bill records when the user has any.
    pub async fn get_user_bills(&self, user: &str) -> Result<Vec<Value>> {
        self.view("get_user_bills", vec![json!(user)]).await
    }

    pub async fn get_bill_transactions(&self, user: &str, bill_id: &str) -> Result<Vec<Value>> {
        let result = self
            .view("get_bill_transactions", vec![json!(user), json!(bill_id)])
            .await?;
        Ok(first_array(result))
    }

    /// `(total octas, bill count)` of the user's pending bills.
    pub async fn get_pending_bills_total(&self, user: &str) -> Result<(u64, u64)> {
        let result = self
            .view("get_pending_bills_total", vec![json!(user)])
            .await?;
        Ok((
            first_u64(&result, "get_pending_bills_total")?,
            nth_u64(&result, 1, "get_pending_bills_total")?,
        ))
    }

    pub async fn get_locked_funds(&self, user: &str) -> Result<u64> {
        let result = self.view("get_locked_funds", vec![json!(user)]).await?;
        first_u64(&result, "get_locked_funds")
    }

    pub async fn get_user_balance(&self, user: &str) -> Result<u64> {
        let result = self.view("get_user_balance", vec![json!(user)]).await?;
        first_u64(&result, "get_user_balance")
    }

    pub async fn get_user_transaction_history(&self, user: &str) -> Result<Vec<Value>> {
        let result = self
            .view("get_user_transaction_history", vec![json!(user)])
            .await?;
        Ok(first_array(result))
    }

    pub async fn is_address_initialized(&self, address: &str) -> Result<bool> {
        let result = self
            .view("is_address_initialized", vec![json!(address)])
            .await?;
        result
            .first()
            .and_then(|v| v.as_bool())
            .ok_or_else(|| AppError::BlockchainRPC("unexpected is_address_initialized result".to_string()))
    }

    pub async fn get_apt_balance(&self, address: &str) -> Result<u64> {
        let result = self.view("get_apt_balance", vec![json!(address)]).await?;
        first_u64(&result, "get_apt_balance")
    }

    pub fn add_bill_payload(
        &self,
        description: &str,
        amount_octas: u64,
        payee: &str,
        due_date: u64,
        bill_id: u64,
        status: u8,
    ) -> Result<EntryFunctionPayload> {
        Ok(payloads::add_bill(
            self.function("add_bill")?,
            description,
            amount_octas,
            payee,
            due_date,
            bill_id,
            status,
        ))
    }

    pub fn update_bill_status_payload(&self, bill_id: &str, status: u8) -> Result<EntryFunctionPayload> {
        Ok(payloads::update_bill_status(
            self.function("update_bill_status")?,
            bill_id,
            status,
        ))
    }

    pub fn pay_all_pending_bills_payload(&self) -> Result<EntryFunctionPayload> {
        Ok(payloads::pay_all_pending_bills(
            self.function("pay_all_pending_bills")?,
        ))
    }

    pub fn lock_funds_payload(&self, amount_octas: u64) -> Result<EntryFunctionPayload> {
        Ok(payloads::lock_funds(self.function("lock_funds")?, amount_octas))
    }
}

fn first_array(result: Vec<Value>) -> Vec<Value> {
    match result.into_iter().next() {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}
