use tenancy::config::DirectoryConfig;
use tenancy::directory::TenantDirectory;
use tenancy::entry::TenantEntry;
use tenancy::entry::codec::{ProtocolVersion, decode, encode};
use tenancy::prefix::{id_to_prefix, prefix_to_id};

#[test]
fn id_prefix_transform_round_trips_across_the_range() {
    for id in [
        0,
        1,
        255,
        256,
        0x0102_0304_0506_0708,
        i64::MAX - 1,
        i64::MAX,
    ] {
        assert_eq!(prefix_to_id(&id_to_prefix(id)).expect("decode"), id);
    }
}

#[test]
fn directory_entries_survive_the_wire() {
    let dir =
        TenantDirectory::new(DirectoryConfig::with_subspace(b"prod/".to_vec())).expect("directory");
    dir.create_tenant(b"alpha", Some(b"group-a")).expect("create");
    dir.create_tenant(b"beta", None).expect("create");

    for (_, entry) in dir.list_tenants(dir.read_version()).expect("list") {
        let bytes = encode(&entry, ProtocolVersion::CURRENT).expect("encode");
        let decoded = decode(&bytes).expect("decode");
        assert_eq!(decoded, entry);
    }
}

#[test]
fn encoding_is_deterministic_for_identical_inputs() {
    let entry = TenantEntry::with_group(11, b"prod/", Some(b"group-a".to_vec()));
    let first = encode(&entry, ProtocolVersion::CURRENT).expect("encode");
    let second = encode(&entry, ProtocolVersion::CURRENT).expect("encode");
    assert_eq!(first, second);
}

#[test]
fn downgrade_to_a_pre_group_version_is_lossy_only_for_the_group() {
    let entry = TenantEntry::with_group(11, b"prod/", Some(b"group-a".to_vec()));
    let bytes = encode(&entry, ProtocolVersion::BASE).expect("encode");
    let decoded = decode(&bytes).expect("decode");

    // Expected downgrade behavior: the group cannot be represented, the
    // rest of the entry is intact.
    assert!(decoded.tenant_group().is_none());
    assert_eq!(decoded.id(), entry.id());
    assert_eq!(decoded.prefix(), entry.prefix());
}

#[test]
fn decode_reconstructs_the_prefix_from_the_id() {
    let entry = TenantEntry::new(77, b"east/");
    let bytes = encode(&entry, ProtocolVersion::CURRENT).expect("encode");
    let decoded = decode(&bytes).expect("decode");

    let mut expected = b"east/".to_vec();
    expected.extend_from_slice(&id_to_prefix(77));
    assert_eq!(decoded.prefix().as_slice(), expected.as_slice());
    assert_eq!(decoded.prefix().tenant_id().expect("id"), 77);
}

#[test]
fn records_from_a_newer_protocol_remain_readable() {
    let entry = TenantEntry::with_group(5, b"prod/", Some(b"g".to_vec()));
    let mut bytes = encode(&entry, ProtocolVersion::CURRENT).expect("encode");
    let future = ProtocolVersion::from_raw(ProtocolVersion::CURRENT.raw() + 0x0300);
    bytes[..8].copy_from_slice(&future.raw().to_be_bytes());
    bytes.extend_from_slice(b"fields this reader has never heard of");

    let decoded = decode(&bytes).expect("decode");
    assert_eq!(decoded, entry);
}

#[test]
fn malformed_records_never_partially_decode() {
    let entry = TenantEntry::with_group(5, b"prod/", Some(b"g".to_vec()));
    let bytes = encode(&entry, ProtocolVersion::CURRENT).expect("encode");

    let err = decode(&bytes[..bytes.len() - 1]).expect_err("truncated");
    assert_eq!(err.code_str(), "format");

    let mut unversioned = bytes.clone();
    unversioned[..8].copy_from_slice(&1u64.to_be_bytes());
    let err = decode(&unversioned).expect_err("unrecognized version");
    assert_eq!(err.code_str(), "format");
}
