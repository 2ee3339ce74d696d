//! Advertising data elements.
//!
//! Advertising and scan-response payloads are a sequence of
//! `[len][type][data; len - 1]` structures.  Parsing stops at the first
//! zero-length or truncated structure.

use crate::config::ADV_DATA_CAPACITY;
use crate::error::HostError;
use heapless::Vec;

/// AD type: flags.
pub const AD_FLAGS: u8 = 0x01;
/// AD type: shortened local name.
pub const AD_NAME_SHORTENED: u8 = 0x08;
/// AD type: complete local name.
pub const AD_NAME_COMPLETE: u8 = 0x09;

/// Flags bit: LE General Discoverable Mode.
pub const LE_GENERAL_DISCOVERABLE: u8 = 0x02;
/// Flags bit: BR/EDR Not Supported.
pub const BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// One parsed advertising structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdElement<'a> {
    pub ad_type: u8,
    pub data: &'a [u8],
}

/// Iterator over the structures of a raw advertising payload.
pub struct AdElements<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for AdElements<'a> {
    type Item = AdElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.pos;
        if i >= self.data.len() {
            return None;
        }
        let len = self.data[i] as usize;
        if len == 0 || i + len >= self.data.len() {
            self.pos = self.data.len();
            return None;
        }
        self.pos = i + len + 1;
        Some(AdElement {
            ad_type: self.data[i + 1],
            data: &self.data[i + 2..i + 1 + len],
        })
    }
}

/// Walk the structures of `data`.
pub fn elements(data: &[u8]) -> AdElements<'_> {
    AdElements { data, pos: 0 }
}

/// Raw bytes of the complete local name, if advertised.
pub fn complete_name(data: &[u8]) -> Option<&[u8]> {
    elements(data)
        .find(|e| e.ad_type == AD_NAME_COMPLETE)
        .map(|e| e.data)
}

/// True when the complete local name equals `name` exactly.
pub fn has_complete_name(data: &[u8], name: &str) -> bool {
    complete_name(data) == Some(name.as_bytes())
}

/// Structures the peripheral puts in its advertising payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdStructure<'a> {
    Flags(u8),
    CompleteName(&'a str),
}

impl AdStructure<'_> {
    fn ad_type(&self) -> u8 {
        match self {
            AdStructure::Flags(_) => AD_FLAGS,
            AdStructure::CompleteName(_) => AD_NAME_COMPLETE,
        }
    }
}

/// Encode `structures` into a legacy (31-byte) advertising payload.
pub fn encode(structures: &[AdStructure<'_>]) -> Result<Vec<u8, ADV_DATA_CAPACITY>, HostError> {
    let mut out = Vec::new();
    for s in structures {
        let flags;
        let body: &[u8] = match s {
            AdStructure::Flags(f) => {
                flags = [*f];
                &flags
            }
            AdStructure::CompleteName(name) => name.as_bytes(),
        };
        out.push((body.len() + 1) as u8)
            .map_err(|_| HostError::NoResources)?;
        out.push(s.ad_type()).map_err(|_| HostError::NoResources)?;
        out.extend_from_slice(body)
            .map_err(|_| HostError::NoResources)?;
    }
    Ok(out)
}
