//! Field-level validation of the payment form. Failures stay in the form
//! view; nothing here touches the network.

use crate::card;
use crate::checkout::error::CheckoutError;
use crate::checkout::types::{CardDetails, CardSubmission, PaymentSession};
use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Everything the payer can type into the checkout form.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    pub currency: String,
    pub amount: String,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub phone_number: String,
    pub narration: Option<String>,
    pub card: CardDetails,
}

/// Formats a raw amount for display: digits and one decimal point kept,
/// thousands separated by commas, decimals capped at two places.
pub fn format_amount_with_commas(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let mut parts = cleaned.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let dec_part = parts.next();

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match dec_part {
        Some(dec) => format!("{}.{}", grouped, &dec[..dec.len().min(2)]),
        None => grouped,
    }
}

/// Parses a display amount back into a decimal, tolerating commas.
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(&raw.replace(',', "")).ok()
}

fn is_name(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Validates the whole form, collecting one error per offending field.
pub fn validate_payment_form(form: &PaymentForm) -> Result<(), Vec<CheckoutError>> {
    let mut errors = Vec::new();

    if form.currency.trim().is_empty() {
        errors.push(CheckoutError::validation("currency", "Currency is required"));
    }

    match parse_amount(&form.amount) {
        Some(amount) if amount > BigDecimal::from(0) => {}
        _ => errors.push(CheckoutError::validation(
            "amount",
            "Amount must be greater than 0",
        )),
    }

    if form.first_name.trim().len() < 2 || !is_name(form.first_name.trim()) {
        errors.push(CheckoutError::validation(
            "first_name",
            "First name must be at least 2 letters",
        ));
    }
    if form.last_name.trim().len() < 2 || !is_name(form.last_name.trim()) {
        errors.push(CheckoutError::validation(
            "last_name",
            "Last name must be at least 2 letters",
        ));
    }

    if form.country_code.trim().is_empty() {
        errors.push(CheckoutError::validation(
            "country_code",
            "Country code is required",
        ));
    }
    if form.phone_number.len() < 7 || !form.phone_number.chars().all(|c| c.is_ascii_digit()) {
        errors.push(CheckoutError::validation(
            "phone_number",
            "Phone number must be at least 7 digits",
        ));
    }

    if !card::is_valid_card_number(&form.card.number) {
        errors.push(CheckoutError::validation("card_number", "Invalid card number"));
    }
    if !card::is_valid_expiry_month(&form.card.expiry_month) {
        errors.push(CheckoutError::validation("expiry_month", "Invalid month (MM)"));
    }
    if !card::is_valid_expiry_year(&form.card.expiry_year) {
        errors.push(CheckoutError::validation("expiry_year", "Card has expired"));
    }
    if !card::is_valid_cvc(&form.card.cvc) {
        errors.push(CheckoutError::validation("cvc", "CVC must be 3 or 4 digits"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl PaymentForm {
    /// Builds the submission payload: card number stripped to digits, the
    /// two-digit expiry year expanded to four, display commas removed from
    /// the amount.
    pub fn to_submission(&self, session: &PaymentSession) -> CardSubmission {
        CardSubmission {
            token: session.session_token.clone(),
            username: session.username.clone(),
            mode: session.mode.clone(),
            country_code: self.country_code.clone(),
            card_number: self.card.number.chars().filter(char::is_ascii_digit).collect(),
            expiry_month: self.card.expiry_month.clone(),
            expiry_year: format!("20{}", self.card.expiry_year),
            cvv: self.card.cvc.clone(),
            currency: self.currency.clone(),
            amount: self.amount.replace(',', ""),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            message: self.narration.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn valid_form() -> PaymentForm {
        let year = (chrono::Utc::now().year() - 2000 + 2) % 100;
        PaymentForm {
            currency: "USD".to_string(),
            amount: "1,250.50".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            country_code: "+44".to_string(),
            phone_number: "7012345678".to_string(),
            narration: None,
            card: CardDetails {
                number: "4242 4242 4242 4242".to_string(),
                expiry_month: "09".to_string(),
                expiry_year: format!("{:02}", year),
                cvc: "123".to_string(),
            },
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_payment_form(&valid_form()).is_ok());
    }

    #[test]
    fn each_field_is_checked() {
        let mut form = valid_form();
        form.amount = "0".to_string();
        form.first_name = "A".to_string();
        form.phone_number = "12ab".to_string();
        form.card.cvc = "12".to_string();
        let errors = validate_payment_form(&form).expect_err("should fail");
        let fields: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                CheckoutError::Validation { field, .. } => field.as_deref(),
                _ => None,
            })
            .collect();
        assert!(fields.contains(&"amount"));
        assert!(fields.contains(&"first_name"));
        assert!(fields.contains(&"phone_number"));
        assert!(fields.contains(&"cvc"));
        assert!(!fields.contains(&"card_number"));
    }

    #[test]
    fn amount_formatting_groups_thousands() {
        assert_eq!(format_amount_with_commas("1234567"), "1,234,567");
        assert_eq!(format_amount_with_commas("1234.567"), "1,234.56");
        assert_eq!(format_amount_with_commas("12"), "12");
        assert_eq!(format_amount_with_commas("abc"), "");
    }

    #[test]
    fn submission_normalizes_card_and_amount() {
        let form = valid_form();
        let session = PaymentSession {
            session_token: "tok_1".to_string(),
            merchant_id: None,
            currency: "USD".to_string(),
            amount: None,
            payer_first_name: String::new(),
            payer_last_name: String::new(),
            phone_country_code: "+44".to_string(),
            phone_number: String::new(),
            narration: None,
            mode: Some("live".to_string()),
            username: Some("merchant".to_string()),
        };
        let submission = form.to_submission(&session);
        assert_eq!(submission.card_number, "4242424242424242");
        assert_eq!(submission.amount, "1250.50");
        assert!(submission.expiry_year.starts_with("20"));
        assert_eq!(submission.token, "tok_1");
        assert_eq!(submission.mode.as_deref(), Some("live"));
    }
}
