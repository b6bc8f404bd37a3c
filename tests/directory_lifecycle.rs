use std::sync::{Arc, Barrier};
use std::thread;

use tenancy::config::DirectoryConfig;
use tenancy::directory::TenantDirectory;

fn directory() -> TenantDirectory {
    TenantDirectory::new(DirectoryConfig::with_subspace(b"tenants/".to_vec())).expect("directory")
}

#[test]
fn create_and_lookup_across_versions() {
    let dir = directory();
    let entry = dir.create_tenant(b"alpha", None).expect("create");
    let v1 = dir.read_version();

    assert!(entry.id() >= 0);
    assert!(entry.prefix().len() >= 8);
    assert_eq!(entry.subspace(), b"tenants/");

    let found = dir
        .lookup_by_name(b"alpha", v1)
        .expect("lookup")
        .expect("present at commit version");
    assert_eq!(found, entry);
    assert!(
        dir.lookup_by_name(b"alpha", 0)
            .expect("lookup")
            .is_none(),
        "must be absent before creation"
    );
}

#[test]
fn delete_is_versioned_not_destructive() {
    let dir = directory();
    dir.create_tenant(b"alpha", None).expect("create");
    let v1 = dir.read_version();
    dir.delete_tenant(b"alpha").expect("delete");
    let v2 = dir.read_version();
    assert!(v1 < v2);

    assert!(dir.lookup_by_name(b"alpha", v1).expect("lookup").is_some());
    assert!(dir.lookup_by_name(b"alpha", v2).expect("lookup").is_none());

    let at_v1 = dir.list_tenants(v1).expect("list");
    assert_eq!(at_v1.len(), 1);
    assert!(dir.list_tenants(v2).expect("list").is_empty());
}

#[test]
fn listing_is_ordered_by_name() {
    let dir = directory();
    dir.create_tenant(b"carol", None).expect("create");
    dir.create_tenant(b"alice", None).expect("create");
    dir.create_tenant(b"bob", None).expect("create");

    let names: Vec<_> = dir
        .list_tenants(dir.read_version())
        .expect("list")
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec![b"alice".to_vec(), b"bob".to_vec(), b"carol".to_vec()]);
}

#[test]
fn group_updates_keep_id_and_prefix() {
    let dir = directory();
    let created = dir.create_tenant(b"alpha", None).expect("create");
    let updated = dir
        .update_tenant_group(b"alpha", Some(b"gold"))
        .expect("update");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.prefix(), created.prefix());
    assert_eq!(updated.tenant_group(), Some(&b"gold".to_vec()));

    let before = dir.read_version() - 1;
    let old = dir
        .lookup_by_name(b"alpha", before)
        .expect("lookup")
        .expect("present");
    assert!(old.tenant_group().is_none(), "old snapshot keeps old config");
}

#[test]
fn prefix_routing_finds_the_owning_tenant() {
    let dir = directory();
    let entry = dir.create_tenant(b"alpha", None).expect("create");
    let head = dir.read_version();

    let mut key = entry.prefix().as_slice().to_vec();
    key.extend_from_slice(b"/user/42");
    let owner = dir
        .lookup_by_prefix(&key, head)
        .expect("route")
        .expect("owned key");
    assert_eq!(owner, b"alpha".to_vec());

    // The bare prefix itself routes too.
    let owner = dir
        .lookup_by_prefix(entry.prefix().as_slice(), head)
        .expect("route")
        .expect("owned key");
    assert_eq!(owner, b"alpha".to_vec());

    assert!(
        dir.lookup_by_prefix(b"unrelated-key", head)
            .expect("route")
            .is_none(),
        "keys outside every registered prefix have no owner"
    );
}

#[test]
fn prefix_routing_respects_the_read_version() {
    let dir = directory();
    let entry = dir.create_tenant(b"alpha", None).expect("create");
    let live = dir.read_version();
    dir.delete_tenant(b"alpha").expect("delete");
    let gone = dir.read_version();

    let key = entry.prefix().as_slice().to_vec();
    assert!(dir.lookup_by_prefix(&key, live).expect("route").is_some());
    assert!(dir.lookup_by_prefix(&key, gone).expect("route").is_none());
}

#[test]
fn racing_creates_resolve_to_one_winner() {
    let dir = Arc::new(directory());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let dir = Arc::clone(&dir);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                dir.create_tenant(b"beta", None)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("join"))
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent create may succeed");
    for result in &results {
        if let Err(err) = result {
            assert_eq!(err.code_str(), "tenant_already_exists");
        }
    }

    // The loser consumed no id: the next creation is adjacent.
    let beta_id = dir
        .lookup_by_name(b"beta", dir.read_version())
        .expect("lookup")
        .expect("present")
        .id();
    let gamma = dir.create_tenant(b"gamma", None).expect("create");
    assert_eq!(gamma.id(), beta_id + 1);
}

#[test]
fn ids_are_never_reused() {
    let dir = directory();
    let a = dir.create_tenant(b"a", None).expect("create");
    let b = dir.create_tenant(b"b", None).expect("create");
    dir.delete_tenant(b"a").expect("delete");
    let c = dir.create_tenant(b"c", None).expect("create");

    assert!(b.id() > a.id());
    assert!(c.id() > b.id(), "deleting a tenant must not recycle its id");
}

#[test]
fn reads_below_the_gc_boundary_fail() {
    let dir = directory();
    dir.create_tenant(b"alpha", None).expect("create");
    let v1 = dir.read_version();
    dir.update_tenant_group(b"alpha", Some(b"g")).expect("update");
    let v2 = dir.read_version();

    dir.advance_oldest_readable_version(v2).expect("advance");
    assert_eq!(dir.oldest_readable_version(), v2);

    // The tenant is alive, but history below the boundary is gone.
    let err = dir.lookup_by_name(b"alpha", v1).expect_err("gc'd version");
    assert_eq!(err.code_str(), "version_too_old");
    assert!(dir.lookup_by_name(b"alpha", v2).expect("lookup").is_some());
}

#[test]
fn gc_cannot_pass_the_newest_commit() {
    let dir = directory();
    dir.create_tenant(b"alpha", None).expect("create");
    let head = dir.read_version();
    let err = dir
        .advance_oldest_readable_version(head + 1)
        .expect_err("past head");
    assert_eq!(err.code_str(), "validation");
}
