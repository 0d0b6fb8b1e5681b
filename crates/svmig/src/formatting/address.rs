//! 🏠 Legacy address → structured [`Address`].
//!
//! 🎬 *[the address column reads "1 Duck Lane$$Quackton$LEEDS$West Yorkshire". someone thought `$` was a good separator. they were not stopped.]*
//!
//! Rules, in order:
//! 1. empty, or the sentinel "Not Available" (any case or spacing) → no address
//! 2. split on `$`, trim, drop empty segments
//! 3. drop segments equal to the town, drop immediate duplicates
//! 4. pull out a recognised UK county, scanning from the last segment backwards
//! 5. first two survivors become `line1` / `line2`
//!
//! Comparisons are normalised: trimmed, lowercased, inner whitespace collapsed.

use tracing::trace;

use crate::model::Address;

const INVALID_ADDRESS_INDICATORS: &[&str] = &["not available"];

/// 🗺️ Counties (ceremonial and historic) that turn up in the legacy data.
pub const UK_COUNTIES: &[&str] = &[
    "Bedfordshire",
    "Berkshire",
    "Bristol",
    "Buckinghamshire",
    "Cambridgeshire",
    "Cheshire",
    "City of London",
    "Cornwall",
    "Cumbria",
    "Derbyshire",
    "Devon",
    "Dorset",
    "Durham",
    "East Riding of Yorkshire",
    "East Sussex",
    "Essex",
    "Gloucestershire",
    "Greater London",
    "Greater Manchester",
    "Hampshire",
    "Herefordshire",
    "Hertfordshire",
    "Isle of Wight",
    "Kent",
    "Lancashire",
    "Leicestershire",
    "Lincolnshire",
    "Merseyside",
    "Middlesex",
    "Norfolk",
    "North Yorkshire",
    "Northamptonshire",
    "Northumberland",
    "Nottinghamshire",
    "Oxfordshire",
    "Rutland",
    "Shropshire",
    "Somerset",
    "South Yorkshire",
    "Staffordshire",
    "Suffolk",
    "Surrey",
    "Tyne and Wear",
    "Warwickshire",
    "West Midlands",
    "West Sussex",
    "West Yorkshire",
    "Wiltshire",
    "Worcestershire",
];

fn norm(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_invalid_address(address: Option<&str>) -> bool {
    match address {
        None => true,
        Some(address) => {
            let normalised = norm(address);
            normalised.is_empty() || INVALID_ADDRESS_INDICATORS.contains(&normalised.as_str())
        }
    }
}

fn county_name(segment: &str) -> Option<&'static str> {
    let wanted = norm(segment);
    UK_COUNTIES.iter().copied().find(|county| norm(county) == wanted)
}

fn extract_county(mut segments: Vec<String>) -> (Option<&'static str>, Vec<String>) {
    for index in (0..segments.len()).rev() {
        if let Some(county) = county_name(&segments[index]) {
            segments.remove(index);
            return (Some(county), segments);
        }
    }
    (None, segments)
}

/// 🏗️ Build a structured address, or `None` when the legacy address is unusable.
pub fn format_address(
    address: Option<&str>,
    town: Option<&str>,
    postcode: Option<&str>,
) -> Option<Address> {
    trace!(?address, ?town, ?postcode, "🏠 formatting address");
    if is_invalid_address(address) {
        return None;
    }

    let town_norm = town.map(norm).unwrap_or_default();
    let mut filtered: Vec<String> = Vec::new();
    for segment in address.unwrap_or_default().split('$').map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        let segment_norm = norm(segment);
        if !town_norm.is_empty() && segment_norm == town_norm {
            continue;
        }
        if filtered.last().is_some_and(|last| norm(last) == segment_norm) {
            continue;
        }
        filtered.push(segment.to_string());
    }

    let (county, filtered) = extract_county(filtered);
    let mut lines = filtered.into_iter();
    Some(Address {
        line1: lines.next(),
        line2: lines.next(),
        county: county.map(str::to_string),
        town: town.map(str::to_string),
        postcode: postcode.map(str::to_string),
    })
}
