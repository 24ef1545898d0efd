/*!
Decoders for the dump formats that feed the lookup structures.

Every decoder turns one source encoding into the normalized records of
[`crate::models`]; none of them reaches into the trie representation.
The `*_url` variants accept local paths and HTTP(S) URLs and handle
gzip/bzip2 transparently.
*/
pub mod delegated;
pub mod riswhois;
pub mod roas;

pub use delegated::{
    read_delegated_extended_stats, read_delegated_extended_stats_url, read_delegated_stats,
    read_delegated_stats_url,
};
pub use riswhois::{read_ris_dump, read_ris_dump_url};
pub use roas::{
    read_roa_csv, read_roa_csv_url, read_routinator_jsonext, read_routinator_jsonext_url,
    read_rpki_client_dump, read_rpki_client_dump_url,
};
