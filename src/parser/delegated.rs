//! NRO / RIR delegated stats decoders.
//!
//! The files are `|`-separated:
//! `registry|cc|type|start|value|date|status[|opaque-id[|category]]`
//! preceded by a version line and per-AFI summary lines. Framing lines
//! are recognized by shape rather than by position, so files with
//! unusual header counts decode the same.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::io::Read;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::ParserError;
use crate::io::get_reader;
use crate::models::{
    AddrRange, Asn, AsnRange, DelegatedStatsEntry, Prefix, PrefixParseError, Resource, ResourceAfi,
};

/// Reads a plain delegated stats file (7 columns, no opaque id).
pub fn read_delegated_stats(reader: impl Read) -> Result<Vec<DelegatedStatsEntry>, ParserError> {
    read_stats(reader, false)
}

/// Reads a delegated extended stats file (9 columns).
pub fn read_delegated_extended_stats(
    reader: impl Read,
) -> Result<Vec<DelegatedStatsEntry>, ParserError> {
    read_stats(reader, true)
}

/// Fetches and reads plain delegated stats from a path or URL.
pub fn read_delegated_stats_url(path: &str) -> Result<Vec<DelegatedStatsEntry>, ParserError> {
    read_delegated_stats(get_reader(path)?)
}

/// Fetches and reads delegated extended stats from a path or URL.
pub fn read_delegated_extended_stats_url(
    path: &str,
) -> Result<Vec<DelegatedStatsEntry>, ParserError> {
    read_delegated_extended_stats(get_reader(path)?)
}

fn read_stats(
    reader: impl Read,
    extended: bool,
) -> Result<Vec<DelegatedStatsEntry>, ParserError> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if !is_resource_record(&record) {
            debug!("skipping framing line starting with {:?}", record.get(0));
            continue;
        }
        entries.push(parse_record(&record, extended)?);
    }
    Ok(entries)
}

/// Resource lines carry an `ipv4`/`ipv6`/`asn` type column and at least
/// the seven mandatory columns; the version header and the per-AFI
/// summary lines do not.
fn is_resource_record(record: &StringRecord) -> bool {
    if record.len() < 7 {
        return false;
    }
    matches!(record.get(2), Some("ipv4" | "ipv6" | "asn"))
}

fn parse_record(
    record: &StringRecord,
    extended: bool,
) -> Result<DelegatedStatsEntry, ParserError> {
    let field = |idx: usize, name: &'static str| {
        record.get(idx).ok_or(ParserError::MissingColumn(name))
    };

    let afi = ResourceAfi::from_str(field(2, "type")?)?;
    let start = field(3, "start")?;
    let value = field(4, "value")?;
    let length: u64 = value
        .parse()
        .map_err(|_| ParserError::InvalidNumber(value.to_string()))?;

    let (opaque_id, category) = if extended {
        (
            Some(field(7, "opaque-id")?.to_string()),
            record.get(8).filter(|v| !v.is_empty()).map(str::to_string),
        )
    } else {
        (None, None)
    };

    Ok(DelegatedStatsEntry {
        rir: field(0, "registry")?.to_string(),
        country: field(1, "cc")?.to_string(),
        afi,
        length,
        date: parse_date(field(5, "date")?)?,
        status: field(6, "status")?.to_string(),
        opaque_id,
        category,
        resource: parse_resource(afi, start, length)?,
    })
}

fn parse_resource(afi: ResourceAfi, start: &str, length: u64) -> Result<Resource, ParserError> {
    match afi {
        ResourceAfi::Ipv4 => {
            let addr = IpAddr::from_str(start)
                .ok()
                .filter(IpAddr::is_ipv4)
                .ok_or_else(|| PrefixParseError(start.to_string()))?;
            Ok(Resource::Ipv4(AddrRange::from_count(addr, length as u128)))
        }
        ResourceAfi::Ipv6 => {
            let prefix = Prefix::from_str(&format!("{start}/{length}"))?;
            Ok(Resource::Ipv6(prefix))
        }
        ResourceAfi::Asn => Ok(Resource::Asn(AsnRange {
            start: Asn::from_str(start)?,
            count: length as u32,
        })),
    }
}

/// Delegation dates are `YYYYMMDD`. `00000000` and empty values appear
/// for never-allocated space and collapse to the epoch.
fn parse_date(value: &str) -> Result<NaiveDate, ParserError> {
    if value.is_empty() || value == "00000000" {
        return Ok(NaiveDate::default());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| ParserError::InvalidDate(value.to_string()))
}
