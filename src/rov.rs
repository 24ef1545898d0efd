//! Route origin validation (RFC 6483 §2).

use log::debug;
use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::lookup::RoaLookup;
use crate::models::{Announcement, RouteOriginAuthorization};

/// Validity of an announcement against the VRPs covering its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOriginValidity {
    Valid,
    Invalid,
    Unknown,
}

impl Display for RouteOriginValidity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteOriginValidity::Valid => write!(f, "valid"),
            RouteOriginValidity::Invalid => write!(f, "invalid"),
            RouteOriginValidity::Unknown => write!(f, "unknown"),
        }
    }
}

/// Determine the route validity state of an announcement.
///
/// Algorithm from [RFC 6483 section 2](https://tools.ietf.org/html/rfc6483#section-2).
pub fn rov_validity(announcement: &Announcement, lookup: &RoaLookup) -> RouteOriginValidity {
    // 1. Select all valid ROAs that include a ROAIPAddress value that
    //    either matches, or is a covering aggregate of, the address
    //    prefix in the route. This selection forms the set of
    //    "candidate ROAs".
    let candidates = lookup.lookup(&announcement.prefix);

    // 2. If the set of candidate ROAs is empty, then the procedure
    //    stops with an outcome of "unknown" (or, synonymously, "not
    //    found", as used in [BGP-PFX]).
    if candidates.is_empty() {
        return RouteOriginValidity::Unknown;
    }

    // 3. If the route's origin AS can be determined and any of the set
    //    of candidate ROAs has an asID value that matches the origin AS
    //    in the route, and the route's address prefix matches the
    //    ROAIPAddress in the ROA (precisely, or as a more specific
    //    within an explicit maxLength), then the procedure halts with
    //    an outcome of "valid".
    for vrp in candidates {
        if authorizes(vrp, announcement) {
            return RouteOriginValidity::Valid;
        }
    }

    // 4. Otherwise, the procedure halts with an outcome of "invalid".
    RouteOriginValidity::Invalid
}

/// Whether a candidate VRP authorizes the announcement. The candidate
/// set only contains covering prefixes, so beyond the origin only the
/// length needs checking: a more specific announcement is authorized up
/// to an explicit max length and no further.
fn authorizes(vrp: &RouteOriginAuthorization, announcement: &Announcement) -> bool {
    if !announcement.origin.matches(vrp.asn) {
        return false;
    }
    if vrp.prefix == announcement.prefix {
        return true;
    }
    vrp.max_length
        .is_some_and(|max_length| max_length >= announcement.prefix.prefix_len())
}

/// Why a candidate VRP did or did not authorize an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOutcome {
    Authorized,
    OriginMismatch,
    ExceedsMaxLength,
}

/// One evaluated candidate VRP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCheck {
    pub vrp: RouteOriginAuthorization,
    pub outcome: CandidateOutcome,
}

/// A verdict together with the per-candidate trace behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RovExplanation {
    pub validity: RouteOriginValidity,
    pub candidates: Vec<CandidateCheck>,
}

/// Verbose variant of [`rov_validity`]: evaluates every candidate VRP
/// instead of halting on the first authorization and reports why each
/// one did or did not match. The verdict is always the same as the
/// terse function's.
pub fn rov_validity_verbose(announcement: &Announcement, lookup: &RoaLookup) -> RovExplanation {
    let candidates = lookup.lookup(&announcement.prefix);
    if candidates.is_empty() {
        return RovExplanation {
            validity: RouteOriginValidity::Unknown,
            candidates: Vec::new(),
        };
    }

    let mut checks = Vec::with_capacity(candidates.len());
    let mut was_valid = false;
    for vrp in candidates {
        let outcome = if !announcement.origin.matches(vrp.asn) {
            debug!(
                "origin mismatch: {} announced by {}, {} authorizes AS{}",
                announcement.prefix, announcement.origin, vrp.prefix, vrp.asn
            );
            CandidateOutcome::OriginMismatch
        } else if vrp.prefix == announcement.prefix
            || vrp
                .max_length
                .is_some_and(|max_length| max_length >= announcement.prefix.prefix_len())
        {
            debug!(
                "valid: {} authorizes {} announced by {}",
                vrp, announcement.prefix, announcement.origin
            );
            was_valid = true;
            CandidateOutcome::Authorized
        } else {
            debug!(
                "length exceeds max length: {} does not cover a /{}",
                vrp,
                announcement.prefix.prefix_len()
            );
            CandidateOutcome::ExceedsMaxLength
        };
        checks.push(CandidateCheck {
            vrp: *vrp,
            outcome,
        });
    }

    RovExplanation {
        validity: if was_valid {
            RouteOriginValidity::Valid
        } else {
            RouteOriginValidity::Invalid
        },
        candidates: checks,
    }
}
