//! IPv4 address validation.
//!
//! Accepts exactly four dot-separated octets of one to three ASCII digits,
//! each in 0..=255. Leading zeros are allowed and normalised away, so the
//! returned `Ipv4Addr` is the canonical key for the address.

use std::net::Ipv4Addr;

use crate::error::{AddressProblem, Result, TallyError};

pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    if text.is_empty() {
        return Err(TallyError::InvalidAddress(AddressProblem::Missing));
    }

    let invalid = || TallyError::InvalidAddress(AddressProblem::Malformed(text.to_string()));
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');

    for slot in octets.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // at most three digits, so this fits in u16
        let value: u16 = part.parse().map_err(|_| invalid())?;
        *slot = u8::try_from(value).map_err(|_| invalid())?;
    }

    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(Ipv4Addr::from(octets))
}
