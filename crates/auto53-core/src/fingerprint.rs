//! Content fingerprints for records
//!
//! A fingerprint identifies a record by its zone, its name and its *set* of
//! addresses. It is a pure function of those fields, recomputed every time
//! it is needed and never stored on the record, so a record mutated after
//! hashing can never be compared through a stale value.
//!
//! Fingerprints are only used as map keys within one reconciliation pass. A
//! collision between two distinct records is accepted as astronomically
//! unlikely and not handled.

use crate::model::Record;
use sha2::{Digest, Sha256};

/// Fingerprint of a record
///
/// Equal for records with equal zone ID, equal name and equal address sets,
/// regardless of address order or duplicate addresses.
pub fn fingerprint(record: &Record) -> u64 {
    let mut hasher = Sha256::new();

    write_field(&mut hasher, record.zone.id.as_bytes());
    write_field(&mut hasher, record.name.as_bytes());

    let ips = record.ip_set();
    hasher.update((ips.len() as u64).to_be_bytes());
    for ip in ips {
        write_field(&mut hasher, ip.as_bytes());
    }

    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Length-prefixed so that field boundaries cannot shift between records
fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Zone;

    fn record(zone: &str, name: &str, ips: &[&str]) -> Record {
        Record::new(
            Zone::new(zone, "apex1"),
            name,
            ips.iter().map(|ip| ip.to_string()).collect(),
        )
    }

    #[test]
    fn test_ip_order_is_irrelevant() {
        let r1 = record("Z", "N", &["1.1.1.1", "2.2.2.2"]);
        let r2 = record("Z", "N", &["2.2.2.2", "1.1.1.1"]);
        assert_eq!(fingerprint(&r1), fingerprint(&r2));
    }

    #[test]
    fn test_duplicates_collapse() {
        let r1 = record("Z", "N", &["1.1.1.1", "1.1.1.1", "2.2.2.2"]);
        let r2 = record("Z", "N", &["2.2.2.2", "1.1.1.1"]);
        assert_eq!(fingerprint(&r1), fingerprint(&r2));
    }

    #[test]
    fn test_every_component_matters() {
        let base = record("Z", "N", &["1.1.1.1"]);
        assert_ne!(fingerprint(&base), fingerprint(&record("Y", "N", &["1.1.1.1"])));
        assert_ne!(fingerprint(&base), fingerprint(&record("Z", "M", &["1.1.1.1"])));
        assert_ne!(fingerprint(&base), fingerprint(&record("Z", "N", &["1.1.1.2"])));
        assert_ne!(fingerprint(&base), fingerprint(&record("Z", "N", &[])));
    }

    #[test]
    fn test_field_boundaries() {
        assert_ne!(
            fingerprint(&record("Z", "ab", &["c"])),
            fingerprint(&record("Z", "a", &["bc"]))
        );
    }

    #[test]
    fn test_zone_display_name_is_not_identity() {
        let mut other = record("Z", "N", &["1.1.1.1"]);
        other.zone.name = "apex1.".to_string();
        assert_eq!(fingerprint(&record("Z", "N", &["1.1.1.1"])), fingerprint(&other));
    }

    #[test]
    fn test_recomputed_after_mutation() {
        let mut r = record("Z", "N", &["1.1.1.1"]);
        let before = fingerprint(&r);
        r.ips.push("2.2.2.2".to_string());
        assert_ne!(before, fingerprint(&r));
    }
}
