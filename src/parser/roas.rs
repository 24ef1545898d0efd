//! Validator VRP export decoders: routinator and rpki-client.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use crate::error::ParserError;
use crate::io::get_reader;
use crate::models::{Asn, Prefix, RoaRecord};

/// Reads routinator/rpki-client `csv` and routinator `csvext` output.
///
/// Columns are resolved by header name: the common
/// `ASN,IP Prefix,Max Length` core works with or without the trust
/// anchor, expiry and validity columns the formats disagree on. `AS`
/// prefixes on the ASN column are accepted.
pub fn read_roa_csv(reader: impl Read) -> Result<Vec<RoaRecord>, ParserError> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|header| header == name);

    let asn_idx = column("ASN").ok_or(ParserError::MissingColumn("ASN"))?;
    let prefix_idx = column("IP Prefix").ok_or(ParserError::MissingColumn("IP Prefix"))?;
    let max_length_idx = column("Max Length").ok_or(ParserError::MissingColumn("Max Length"))?;
    let trust_anchor_idx = column("Trust Anchor");
    let expires_idx = column("Expires");
    let uri_idx = column("URI");
    let not_before_idx = column("Not Before");
    let not_after_idx = column("Not After");

    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .filter(|value| !value.is_empty())
        };

        let asn = Asn::from_str(record.get(asn_idx).ok_or(ParserError::MissingColumn("ASN"))?)?;
        let prefix = Prefix::from_str(
            record
                .get(prefix_idx)
                .ok_or(ParserError::MissingColumn("IP Prefix"))?,
        )?;
        let max_length = cell(Some(max_length_idx))
            .map(|value| {
                value
                    .parse::<u8>()
                    .map_err(|_| ParserError::InvalidNumber(value.to_string()))
            })
            .transpose()?;

        records.push(RoaRecord {
            asn,
            prefix,
            max_length,
            trust_anchor: cell(trust_anchor_idx).map(str::to_string),
            uri: cell(uri_idx).map(str::to_string),
            expires: cell(expires_idx).map(parse_unix_seconds).transpose()?,
            not_before: cell(not_before_idx).map(parse_timestamp).transpose()?,
            not_after: cell(not_after_idx).map(parse_timestamp).transpose()?,
        });
    }
    Ok(records)
}

/// Fetches and reads validator CSV output from a path or URL.
pub fn read_roa_csv_url(path: &str) -> Result<Vec<RoaRecord>, ParserError> {
    read_roa_csv(get_reader(path)?)
}

/// One line of the rpki-client JSON dump: a ROA object carrying its
/// VRPs.
///
/// ```json
/// {
///   "file": "repo-rpki.idnic.net/repo/.../....roa",
///   "type": "roa",
///   "sia": "rsync://repo-rpki.idnic.net/repo/.../....roa",
///   "expires": 1720266202,
///   "vrps": [{"prefix": "180.214.246.0/24", "asid": 38150, "maxlen": 24}],
///   "validation": "OK"
/// }
/// ```
#[derive(Debug, Deserialize)]
struct DumpObject {
    #[serde(default)]
    sia: Option<String>,
    #[serde(default)]
    expires: Option<i64>,
    #[serde(default)]
    vrps: Vec<DumpVrp>,
}

#[derive(Debug, Deserialize)]
struct DumpVrp {
    prefix: Prefix,
    asid: u32,
    #[serde(default)]
    maxlen: Option<u8>,
}

/// Reads the rpki-client JSON dump format: one JSON object per line,
/// flattened into one record per VRP.
pub fn read_rpki_client_dump(reader: impl Read) -> Result<Vec<RoaRecord>, ParserError> {
    let mut records = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let object: DumpObject = serde_json::from_str(&line)?;
        let expires = object
            .expires
            .map(|seconds| {
                Utc.timestamp_opt(seconds, 0)
                    .single()
                    .ok_or_else(|| ParserError::InvalidDate(seconds.to_string()))
            })
            .transpose()?;
        for vrp in object.vrps {
            records.push(RoaRecord {
                asn: Asn::new(vrp.asid),
                prefix: vrp.prefix,
                max_length: vrp.maxlen,
                trust_anchor: None,
                uri: object.sia.clone(),
                expires,
                not_before: None,
                not_after: None,
            });
        }
    }
    Ok(records)
}

/// Fetches and reads an rpki-client dump from a path or URL.
pub fn read_rpki_client_dump_url(path: &str) -> Result<Vec<RoaRecord>, ParserError> {
    read_rpki_client_dump(get_reader(path)?)
}

#[derive(Debug, Deserialize)]
struct JsonExt {
    roas: Vec<JsonExtRoa>,
}

#[derive(Debug, Deserialize)]
struct JsonExtRoa {
    asn: String,
    prefix: Prefix,
    #[serde(rename = "maxLength")]
    max_length: Option<u8>,
    #[serde(default)]
    source: Vec<JsonExtSource>,
}

#[derive(Debug, Deserialize)]
struct JsonExtSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    tal: Option<String>,
    #[serde(default)]
    validity: Option<JsonExtValidity>,
}

#[derive(Debug, Deserialize)]
struct JsonExtValidity {
    #[serde(rename = "notBefore")]
    not_before: DateTime<Utc>,
    #[serde(rename = "notAfter")]
    not_after: DateTime<Utc>,
}

/// Reads routinator's `jsonext` output, flattening each ROA into one
/// record per source object.
pub fn read_routinator_jsonext(reader: impl Read) -> Result<Vec<RoaRecord>, ParserError> {
    let parsed: JsonExt = serde_json::from_reader(reader)?;
    let mut records = Vec::new();
    for roa in parsed.roas {
        let base = RoaRecord {
            asn: Asn::from_str(&roa.asn)?,
            prefix: roa.prefix,
            max_length: roa.max_length,
            trust_anchor: None,
            uri: None,
            expires: None,
            not_before: None,
            not_after: None,
        };
        if roa.source.is_empty() {
            records.push(base);
            continue;
        }
        for source in roa.source {
            let mut record = base.clone();
            record.trust_anchor = source.tal;
            record.uri = source.uri;
            record.not_before = source.validity.as_ref().map(|validity| validity.not_before);
            record.not_after = source.validity.as_ref().map(|validity| validity.not_after);
            records.push(record);
        }
    }
    Ok(records)
}

/// Fetches and reads routinator jsonext output from a path or URL.
pub fn read_routinator_jsonext_url(path: &str) -> Result<Vec<RoaRecord>, ParserError> {
    read_routinator_jsonext(get_reader(path)?)
}

fn parse_unix_seconds(value: &str) -> Result<DateTime<Utc>, ParserError> {
    let seconds: i64 = value
        .parse()
        .map_err(|_| ParserError::InvalidDate(value.to_string()))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ParserError::InvalidDate(value.to_string()))
}

/// Validity columns appear both as RFC 3339 and as naive UTC
/// timestamps, depending on the export.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParserError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ParserError::InvalidDate(value.to_string()))
}
