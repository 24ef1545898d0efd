/*!
Analysis library for Internet number-resource data: IP/ASN delegation
records, BGP visibility dumps and Route Origin Authorizations.

Everything revolves around prefix-containment questions: "which
registry owns this address range", "which ASNs are authorized to
originate this prefix", "is this announcement RPKI-valid". A binary
prefix trie per address family ([`trie::PrefixTrie`]) backs a lookup
facade ([`lookup::PrefixLookup`]) with four traversal modes: exact
match, the ancestor chain of less specifics, descendants under a query,
and the union of both directions. On top of it sit the delegation,
visibility and VRP lookups and the RFC 6483 §2 route origin validation
procedure ([`rov::rov_validity`]).

Data is decoded once per batch ([`parser`]), loaded into the lookups,
and from then on only read; shared references to a built lookup may be
queried concurrently.

## Example

```
use std::str::FromStr;
use rpki_analysis::models::{Announcement, Asn, OriginAsn, Prefix, RouteOriginAuthorization};
use rpki_analysis::lookup::RoaLookup;
use rpki_analysis::rov::{rov_validity, RouteOriginValidity};

let lookup = RoaLookup::new([RouteOriginAuthorization::new(
    Asn::new(3333),
    Prefix::from_str("193.0.0.0/21")?,
    Some(21),
)]);

let announcement = Announcement::new(
    Prefix::from_str("193.0.0.0/21")?,
    OriginAsn::from("3333"),
);
assert_eq!(rov_validity(&announcement, &lookup), RouteOriginValidity::Valid);
# Ok::<(), rpki_analysis::models::PrefixParseError>(())
```
*/

pub mod error;
pub mod io;
pub mod lookup;
pub mod models;
pub mod parser;
pub mod rov;
pub mod trie;

pub use crate::error::{LookupError, ParserError};
pub use crate::lookup::{
    CombinedAllocationsLookup, PrefixLookup, RirLookup, RisWhoisLookup, RoaLookup,
    StatsEntryLookup,
};
pub use crate::models::{
    AddrRange, Afi, Announcement, Asn, AsnRange, CombinedEntry, DelegatedStatsEntry, OriginAsn,
    Prefix, Resource, ResourceAfi, RisEntry, RoaRecord, RouteOriginAuthorization,
};
pub use crate::rov::{rov_validity, rov_validity_verbose, RouteOriginValidity, RovExplanation};
pub use crate::trie::PrefixTrie;
