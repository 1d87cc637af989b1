//! Synthetic Document Numbers
//!
//! The gateway requires a CPF-shaped customer document. The storefront does
//! not collect one, so the checkout fills in a structurally valid number:
//! nine random digits plus the two mod-11 check digits. It identifies no one.

use rand::Rng;

const BASE_DIGITS: usize = 9;
const DOCUMENT_LEN: usize = 11;

/// Generate an 11-digit document with valid check digits
pub fn generate_document() -> String {
    generate_document_with(&mut rand::thread_rng())
}

pub fn generate_document_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut digits: Vec<u8> = (0..BASE_DIGITS).map(|_| rng.gen_range(0..10)).collect();
    digits.push(check_digit(&digits));
    digits.push(check_digit(&digits));
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Whether `document` is 11 digits with matching check digits
pub fn is_valid_cpf(document: &str) -> bool {
    if document.len() != DOCUMENT_LEN || !document.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u8> = document.bytes().map(|b| b - b'0').collect();
    check_digit(&digits[..BASE_DIGITS]) == digits[BASE_DIGITS]
        && check_digit(&digits[..=BASE_DIGITS]) == digits[BASE_DIGITS + 1]
}

/// Weights run from `len + 1` down to 2
fn check_digit(digits: &[u8]) -> u8 {
    let top = u32::try_from(digits.len()).unwrap_or(0) + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=top).rev())
        .map(|(d, weight)| u32::from(*d) * weight)
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => u8::try_from(r).unwrap_or(0),
    }
}
