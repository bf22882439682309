use crate::models::{Bill, BillStatus};

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    service: &str,
    due_date: &str,
    amount: f64,
    status: BillStatus,
    description: &str,
    category: &str,
    last_paid: Option<&str>,
) -> Bill {
    Bill {
        id: id.to_string(),
        service: service.to_string(),
        due_date: due_date.to_string(),
        amount,
        status,
        description: Some(description.to_string()),
        category: category.to_string(),
        last_paid: last_paid.map(str::to_string),
        payee: None,
    }
}

/// Bills shown before a wallet is connected, and kept whenever a sync
/// cannot run.
pub fn sample_bills() -> Vec<Bill> {
    vec![
        sample(
            "1",
            "Electricity",
            "2024-01-15",
            125.50,
            BillStatus::Pending,
            "Monthly electricity bill",
            "Utilities",
            Some("2023-12-15"),
        ),
        sample(
            "2",
            "Internet",
            "2024-01-18",
            79.99,
            BillStatus::AutoPayEnabled,
            "Fiber internet service",
            "Telecommunications",
            Some("2023-12-18"),
        ),
        sample(
            "3",
            "Water",
            "2024-01-10",
            45.25,
            BillStatus::Paid,
            "Municipal water service",
            "Utilities",
            Some("2024-01-08"),
        ),
        sample(
            "4",
            "Gas",
            "2024-01-20",
            98.75,
            BillStatus::Pending,
            "Natural gas heating",
            "Utilities",
            None,
        ),
        sample(
            "5",
            "Mobile Phone",
            "2024-01-25",
            65.00,
            BillStatus::AutoPayEnabled,
            "Unlimited mobile plan",
            "Telecommunications",
            Some("2023-12-25"),
        ),
        sample(
            "6",
            "Insurance",
            "2024-01-30",
            225.00,
            BillStatus::Pending,
            "Home insurance premium",
            "Insurance",
            None,
        ),
    ]
}
