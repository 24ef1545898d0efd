//! RIPE RIS `riswhoisdump` decoder.

use log::warn;
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use crate::error::ParserError;
use crate::io::get_reader;
use crate::models::{OriginAsn, Prefix, RisEntry};

/// Reads a riswhoisdump file: whitespace-separated
/// `origin prefix seen_by_peers` rows with `%` comment lines.
///
/// AS-SET origins such as `{12703}` are kept as text; they can never
/// become RPKI valid (RFC 6907 §7.1.8) but stay visible in lookups.
pub fn read_ris_dump(reader: impl Read) -> Result<Vec<RisEntry>, ParserError> {
    let mut entries = Vec::new();
    let mut as_set_rows = 0usize;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        let mut columns = line.split_whitespace();
        let origin = columns.next().ok_or(ParserError::MissingColumn("origin"))?;
        let prefix = columns.next().ok_or(ParserError::MissingColumn("prefix"))?;
        let peers = columns
            .next()
            .ok_or(ParserError::MissingColumn("seen_by_peers"))?;

        let origin = OriginAsn::from(origin);
        if matches!(origin, OriginAsn::AsSet(_)) {
            as_set_rows += 1;
        }

        entries.push(RisEntry {
            origin,
            prefix: Prefix::from_str(prefix)?,
            seen_by_peers: peers
                .parse()
                .map_err(|_| ParserError::InvalidNumber(peers.to_string()))?,
        });
    }

    if as_set_rows > 0 {
        warn!(
            "RIS dump contains {as_set_rows} row(s) with an AS_SET; these will never be RPKI \
             valid (https://tools.ietf.org/html/rfc6907#section-7.1.8)"
        );
    }
    Ok(entries)
}

/// Fetches and reads a riswhoisdump from a path or URL.
pub fn read_ris_dump_url(path: &str) -> Result<Vec<RisEntry>, ParserError> {
    read_ris_dump(get_reader(path)?)
}
