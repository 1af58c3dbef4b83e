//! Validation utilities for the Phone Store POS

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::MONEY_SCALE;

// ============================================================================
// Sale and Catalog Validations
// ============================================================================

/// Validate a sale quantity (at least one unit)
pub fn validate_sale_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Validate a stock quantity (never negative)
pub fn validate_stock_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a money amount: non-negative with at most two decimal places
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price cannot be negative");
    }
    if price.normalize().scale() > MONEY_SCALE {
        return Err("Price cannot have more than two decimal places");
    }
    Ok(())
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| "Date must be in YYYY-MM-DD format")
}

/// Validate an IMEI: 15 digits with a valid Luhn check digit
pub fn validate_imei(imei: &str) -> Result<(), &'static str> {
    if imei.len() != 15 || !imei.chars().all(|c| c.is_ascii_digit()) {
        return Err("IMEI must be exactly 15 digits");
    }

    let digits: Vec<u32> = imei.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    if sum % 10 != 0 {
        return Err("Invalid IMEI check digit");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a contact phone number: 7 to 15 digits, allowing `+`, spaces and dashes
pub fn validate_contact_number(phone: &str) -> Result<(), &'static str> {
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err("Phone number contains invalid characters");
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have 7 to 15 digits");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
