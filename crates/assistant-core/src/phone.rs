//! Phone-number normalization and timezone inference.
//!
//! Senders arrive as `whatsapp:+14155552345`-style addresses. Lookups must
//! converge on one canonical form, so normalization is strict and
//! deterministic: strip the channel prefix, drop formatting characters, and
//! require an E.164-shaped result.

use thiserror::Error;

/// Channel prefix the messaging provider puts in front of addresses.
const CHANNEL_PREFIX: &str = "whatsapp:";

/// Errors from phone-number normalization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("empty phone number")]
    Empty,
    #[error("phone number is not E.164: {0}")]
    NotE164(String),
}

/// Normalize a raw sender address to E.164 (`+` followed by 7-15 digits).
///
/// Accepts the `whatsapp:` channel prefix and common formatting characters
/// (spaces, dashes, dots, parentheses). The same input always yields the
/// same output.
pub fn normalize_e164(raw: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim().trim_start_matches(CHANNEL_PREFIX).trim();
    if trimmed.is_empty() {
        return Err(PhoneError::Empty);
    }

    let mut digits = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        match c {
            '+' if i == 0 => {}
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(PhoneError::NotE164(raw.to_string())),
        }
    }

    if !trimmed.starts_with('+') || digits.len() < 7 || digits.len() > 15 {
        return Err(PhoneError::NotE164(raw.to_string()));
    }

    Ok(format!("+{}", digits))
}

/// Infer an IANA timezone name from an E.164 number's country prefix.
///
/// Longest-prefix match over the calling codes we see in practice. Countries
/// spanning several zones map to their most populous one, which is good
/// enough for date-boundary interpretation. Returns `None` for unknown
/// prefixes; callers fall back to UTC.
pub fn infer_timezone(e164: &str) -> Option<&'static str> {
    let normalized = normalize_e164(e164).ok()?;
    let digits = &normalized[1..];

    // Try 4-digit down to 1-digit calling codes.
    for len in (1..=4.min(digits.len())).rev() {
        if let Some(tz) = zone_for_calling_code(&digits[..len]) {
            return Some(tz);
        }
    }
    None
}

fn zone_for_calling_code(code: &str) -> Option<&'static str> {
    let tz = match code {
        "1" => "America/New_York",
        "7" => "Europe/Moscow",
        "20" => "Africa/Cairo",
        "27" => "Africa/Johannesburg",
        "31" => "Europe/Amsterdam",
        "33" => "Europe/Paris",
        "34" => "Europe/Madrid",
        "39" => "Europe/Rome",
        "44" => "Europe/London",
        "46" => "Europe/Stockholm",
        "48" => "Europe/Warsaw",
        "49" => "Europe/Berlin",
        "52" => "America/Mexico_City",
        "55" => "America/Sao_Paulo",
        "61" => "Australia/Sydney",
        "62" => "Asia/Jakarta",
        "63" => "Asia/Manila",
        "64" => "Pacific/Auckland",
        "65" => "Asia/Singapore",
        "66" => "Asia/Bangkok",
        "81" => "Asia/Tokyo",
        "82" => "Asia/Seoul",
        "84" => "Asia/Ho_Chi_Minh",
        "86" => "Asia/Shanghai",
        "90" => "Europe/Istanbul",
        "91" => "Asia/Kolkata",
        "92" => "Asia/Karachi",
        "234" => "Africa/Lagos",
        "254" => "Africa/Nairobi",
        "351" => "Europe/Lisbon",
        "353" => "Europe/Dublin",
        "880" => "Asia/Dhaka",
        "966" => "Asia/Riyadh",
        "971" => "Asia/Dubai",
        "972" => "Asia/Jerusalem",
        _ => return None,
    };
    Some(tz)
}
