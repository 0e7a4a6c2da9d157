//! PII masking pipeline.
//!
//! Scrubs emails and phone numbers from user text before it reaches a
//! language model. Masking is total: it never fails, text without matches
//! passes through unchanged, and the transform is irreversible — the
//! original address or number cannot be reconstructed from the output.
//!
//! Policy: emails use partial redaction (`john@example.com` →
//! `j***@example.com`), keeping the first local-part character and the
//! domain visible so users can recognize which address was scrubbed.
//! Phones keep at most their last 2 digits (`987-654-3210` →
//! `********10`).
//!
//! Order matters: emails are masked before phones so a digit run inside
//! an address is never misread as a phone number. Each pass walks its
//! matches left-to-right and never re-scans masked output, which makes
//! `mask` idempotent.

use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::trace;

/// Redaction character used for masked digits and local parts.
const REDACT: char = '*';

/// Digit counts accepted as a phone number after stripping separators.
/// Anything shorter is a false positive (order codes, short PINs);
/// anything longer exceeds E.164.
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 4..=15;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Permissive local-part/domain classes with a dotted TLD.
        Regex::new(r"[A-Za-z0-9.+_-]+@[A-Za-z0-9._-]+\.[A-Za-z0-9._-]+")
            .expect("email pattern is valid")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Optional country code, optional parenthesized area code, digit
        // groups joined by `-`, `.` or spaces. Candidates are validated by
        // digit count before masking.
        Regex::new(r"(?:\+?\d{1,3})?[-. (]*\d{3}[-. )]*\d{3}[-. ]*\d{4}")
            .expect("phone pattern is valid")
    })
}

/// Mask every email address in `text` using partial redaction.
///
/// The first local-part character and the full domain survive; the rest
/// of the local part becomes `***`.
pub fn mask_emails(text: &str) -> String {
    replace_matches(text, email_re(), |m| {
        let (local, domain) = m.split_once('@').unwrap_or((m, ""));
        let first = local.chars().next().unwrap_or(REDACT);
        Some(format!("{first}***@{domain}"))
    })
}

/// Mask every phone number in `text`, keeping at most the last 2 digits.
///
/// Candidates whose digit count falls outside [`PHONE_DIGITS`] are left
/// untouched as false positives.
pub fn mask_phones(text: &str) -> String {
    replace_matches(text, phone_re(), |m| {
        let digits: Vec<char> = m.chars().filter(|c| c.is_ascii_digit()).collect();
        if !PHONE_DIGITS.contains(&digits.len()) {
            trace!(candidate = %m, digits = digits.len(), "skipping phone candidate");
            return None;
        }
        let mut masked: String = std::iter::repeat(REDACT).take(digits.len() - 2).collect();
        masked.extend(&digits[digits.len() - 2..]);
        Some(masked)
    })
}

/// Mask all supported PII in `text`.
///
/// Total: empty input comes back empty, text without matches comes back
/// unchanged, and `mask(mask(t)) == mask(t)`.
pub fn mask(text: &str) -> String {
    if text.is_empty() {
        return text.to_string();
    }
    mask_phones(&mask_emails(text))
}

/// Rebuild `text` with each regex match replaced by `replacement(match)`.
///
/// Matches are consumed left-to-right without re-scanning replaced output.
/// A `None` from the callback keeps the original span (rejected candidate).
fn replace_matches<F>(text: &str, re: &Regex, replacement: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in re.find_iter(text) {
        out.push_str(&text[last_end..m.start()]);
        match replacement(m.as_str()) {
            Some(masked) => out.push_str(&masked),
            None => out.push_str(m.as_str()),
        }
        last_end = m.end();
    }

    out.push_str(&text[last_end..]);
    out
}
