//! Ready-made values for tests.

use realty_domain::{
    id::UserId,
    money::{Amount, Balance},
    participant::{Role, UserRecord},
};
use rust_decimal::Decimal;

/// Parses a decimal literal such as `"500.00"`.
pub fn decimal(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// Parses a positive amount.
pub fn amount(value: &str) -> Amount {
    Amount::new(decimal(value)).unwrap()
}

/// Parses a non-negative balance.
pub fn balance(value: &str) -> Balance {
    Balance::new(decimal(value)).unwrap()
}

/// Returns an account number that does not collide with other calls.
pub fn account_number() -> String {
    format!("TRUST-{:08}", rand::random::<u32>() % 100_000_000)
}

/// Builds a fully populated user for `role`, with agent or lawyer fields filled for every role.
pub fn user(role: Role) -> UserRecord {
    UserRecord::builder()
        .id(UserId::generate())
        .email(format!("{role}@example.com"))
        .role(role)
        .name(format!("Test {role}"))
        .phone("+1 555 0100".to_owned())
        .license_number("LIC-42".to_owned())
        .brokerage("Harbour Realty".to_owned())
        .bar_number("BAR-7".to_owned())
        .law_firm("Keller & Stone".to_owned())
        .build()
}
