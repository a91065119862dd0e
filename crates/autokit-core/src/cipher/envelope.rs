//! OpenPGP envelope detection
//!
//! Classifies content by structure only: an ASCII-armored `PGP MESSAGE`
//! block, or a binary stream whose first packet is one of the encryption
//! packet types. Nothing is decrypted.

const ARMOR_MESSAGE_BEGIN: &[u8] = b"-----BEGIN PGP MESSAGE-----";
const ARMOR_MESSAGE_END: &[u8] = b"-----END PGP MESSAGE-----";

/// Public-Key Encrypted Session Key
const TAG_PKESK: u8 = 1;
/// Symmetric-Key Encrypted Session Key
const TAG_SKESK: u8 = 3;
/// Symmetrically Encrypted Data
const TAG_SED: u8 = 9;
/// Symmetrically Encrypted and Integrity Protected Data
const TAG_SEIPD: u8 = 18;
/// AEAD Encrypted Data
const TAG_AEAD: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Encrypted,
    Plaintext,
    /// Starts like an encrypted message but is truncated or malformed.
    Unreadable,
}

pub fn sniff(data: &[u8]) -> Envelope {
    let trimmed = trim_leading_whitespace(data);
    if trimmed.starts_with(ARMOR_MESSAGE_BEGIN) {
        return if contains(trimmed, ARMOR_MESSAGE_END) {
            Envelope::Encrypted
        } else {
            Envelope::Unreadable
        };
    }
    sniff_binary(data)
}

fn sniff_binary(data: &[u8]) -> Envelope {
    let Some(&first) = data.first() else {
        return Envelope::Plaintext;
    };
    if first & 0x80 == 0 {
        return Envelope::Plaintext;
    }

    let new_format = first & 0x40 != 0;
    let tag = if new_format {
        first & 0x3f
    } else {
        (first >> 2) & 0x0f
    };
    if !matches!(tag, TAG_PKESK | TAG_SKESK | TAG_SED | TAG_SEIPD | TAG_AEAD) {
        return Envelope::Plaintext;
    }

    let header = if new_format {
        new_format_length(&data[1..])
    } else {
        old_format_length(first & 0x03, &data[1..])
    };
    let Some((header_len, body_len)) = header else {
        return Envelope::Unreadable;
    };

    let body_start = 1 + header_len;
    let body = match body_len {
        Some(len) => match data.get(body_start..body_start + len) {
            Some(body) => body,
            None => return Envelope::Unreadable,
        },
        None => &data[body_start..],
    };

    match version_matches(tag, body) {
        Some(true) => Envelope::Encrypted,
        Some(false) => Envelope::Plaintext,
        None => Envelope::Unreadable,
    }
}

/// Returns `(length octets, body length)`; `None` body length means the
/// packet runs to the end of the data.
fn new_format_length(rest: &[u8]) -> Option<(usize, Option<usize>)> {
    let &l0 = rest.first()?;
    match l0 {
        0..=191 => Some((1, Some(l0 as usize))),
        192..=223 => {
            let &l1 = rest.get(1)?;
            Some((2, Some(((l0 as usize - 192) << 8) + l1 as usize + 192)))
        }
        // Partial body: only the first chunk is checked.
        224..=254 => Some((1, Some(1usize << (l0 & 0x1f)))),
        255 => {
            let bytes = rest.get(1..5)?;
            let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Some((5, Some(len as usize)))
        }
    }
}

fn old_format_length(length_type: u8, rest: &[u8]) -> Option<(usize, Option<usize>)> {
    match length_type {
        0 => rest.first().map(|&l| (1, Some(l as usize))),
        1 => {
            let bytes = rest.get(..2)?;
            Some((2, Some(u16::from_be_bytes([bytes[0], bytes[1]]) as usize)))
        }
        2 => {
            let bytes = rest.get(..4)?;
            let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Some((4, Some(len as usize)))
        }
        _ => Some((0, None)),
    }
}

/// Check the packet version octet. `None` when the body is empty.
fn version_matches(tag: u8, body: &[u8]) -> Option<bool> {
    if tag == TAG_SED {
        return Some(true);
    }
    let &version = body.first()?;
    Some(match tag {
        TAG_PKESK => matches!(version, 3 | 6),
        TAG_SKESK => matches!(version, 4..=6),
        TAG_SEIPD => matches!(version, 1 | 2),
        TAG_AEAD => version == 1,
        _ => false,
    })
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[start..]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
