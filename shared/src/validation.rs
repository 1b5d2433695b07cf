//! Validation helpers for stock-count drafts
//!
//! Small field validators used by the reconciliation engine. Each returns
//! a static message so callers can attach their own field context.

use rust_decimal::Decimal;

/// Validate a brand name is present.
pub fn validate_brand(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Brand is required");
    }
    Ok(())
}

/// Validate a scanned barcode: non-empty, printable, sane length.
pub fn validate_barcode(barcode: &str) -> Result<(), &'static str> {
    let trimmed = barcode.trim();
    if trimmed.is_empty() {
        return Err("Barcode is required");
    }
    if trimmed.len() > 64 {
        return Err("Barcode is too long");
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Barcode contains control characters");
    }
    Ok(())
}

/// Validate a sell price is present and non-negative.
pub fn validate_sell_price(price: Option<Decimal>) -> Result<(), &'static str> {
    match price {
        None => Err("Sell price is required"),
        Some(p) if p < Decimal::ZERO => Err("Sell price cannot be negative"),
        Some(_) => Ok(()),
    }
}

/// Validate a quantity delta. Zero is an edit-only save; negatives are
/// rejected.
pub fn validate_add_qty(add_qty: i32) -> Result<(), &'static str> {
    if add_qty < 0 {
        return Err("Add quantity cannot be negative");
    }
    Ok(())
}

/// Validate a tax rate percentage.
pub fn validate_tax_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::from(100) {
        return Err("Tax rate must be between 0 and 100");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
