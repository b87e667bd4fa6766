use super::common::{node, path, ControlCall, Fixture};

#[tokio::test]
async fn twentieth_shared_lock_orders_a_copy() {
    let fixture = Fixture::new();
    fixture.naming.register(node(1), vec![path("/a/b/c")]).expect("register");
    fixture.naming.register(node(2), Vec::new()).expect("register");

    for round in 0..19 {
        fixture.naming.lock(&path("/a/b/c"), false).await.expect("lock");
        fixture.naming.unlock(&path("/a/b/c"), false).expect("unlock");
        assert!(fixture.control.calls().is_empty(), "no copy before round 20, at {round}");
    }

    fixture.naming.lock(&path("/a/b/c"), false).await.expect("lock");
    fixture.naming.unlock(&path("/a/b/c"), false).expect("unlock");
    assert_eq!(
        fixture.control.calls(),
        vec![ControlCall::Copy {
            node: node(2),
            path: path("/a/b/c"),
            source: node(1).data,
        }]
    );
}

#[tokio::test]
async fn threshold_is_configurable() {
    let fixture = Fixture::with_threshold(2);
    fixture.naming.register(node(1), vec![path("/f")]).expect("register");
    fixture.naming.register(node(2), Vec::new()).expect("register");

    fixture.naming.lock(&path("/f"), false).await.expect("lock");
    fixture.naming.unlock(&path("/f"), false).expect("unlock");
    assert!(fixture.control.calls().is_empty());

    fixture.naming.lock(&path("/f"), false).await.expect("lock");
    fixture.naming.unlock(&path("/f"), false).expect("unlock");
    assert_eq!(fixture.control.calls().len(), 1);
}

#[tokio::test]
async fn counter_resets_even_without_a_spare_node() {
    let fixture = Fixture::with_threshold(3);
    fixture.naming.register(node(1), vec![path("/solo")]).expect("register");

    // Two full windows with nowhere to copy to.
    for _ in 0..6 {
        fixture.naming.lock(&path("/solo"), false).await.expect("lock");
        fixture.naming.unlock(&path("/solo"), false).expect("unlock");
    }
    assert!(fixture.control.calls().is_empty());

    // A spare appears; the counter starts from zero, so a fresh window is
    // needed before the copy fires.
    fixture.naming.register(node(2), Vec::new()).expect("register");
    for _ in 0..2 {
        fixture.naming.lock(&path("/solo"), false).await.expect("lock");
        fixture.naming.unlock(&path("/solo"), false).expect("unlock");
    }
    assert!(fixture.control.calls().is_empty());
    fixture.naming.lock(&path("/solo"), false).await.expect("lock");
    fixture.naming.unlock(&path("/solo"), false).expect("unlock");
    assert_eq!(fixture.control.calls().len(), 1);
}

#[tokio::test]
async fn write_intent_invalidates_extra_replicas() {
    let fixture = Fixture::with_threshold(1);
    fixture.naming.register(node(1), vec![path("/doc")]).expect("register");
    fixture.naming.register(node(2), Vec::new()).expect("register");

    // One shared window replicates onto the spare node.
    fixture.naming.lock(&path("/doc"), false).await.expect("lock");
    fixture.naming.unlock(&path("/doc"), false).expect("unlock");

    fixture.naming.lock(&path("/doc"), true).await.expect("lock");
    fixture.naming.unlock(&path("/doc"), true).expect("unlock");

    let calls = fixture.control.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], ControlCall::Copy { .. }));
    // Exactly one replica was dropped and told to delete its copy.
    match &calls[1] {
        ControlCall::Delete { node: dropped, path: p } => {
            assert_eq!(p, &path("/doc"));
            assert!(*dropped == node(1) || *dropped == node(2));
        }
        other => panic!("expected a delete, got {other:?}"),
    }

    // A second exclusive acquire finds a single replica and does nothing.
    fixture.naming.lock(&path("/doc"), true).await.expect("lock");
    fixture.naming.unlock(&path("/doc"), true).expect("unlock");
    assert_eq!(fixture.control.calls().len(), 2);
}

#[tokio::test]
async fn failed_copy_leaves_the_host_set_alone() {
    let fixture = Fixture::with_threshold(1);
    fixture.naming.register(node(1), vec![path("/f")]).expect("register");
    fixture.naming.register(node(2), Vec::new()).expect("register");
    fixture.control.mark_unreachable(node(2));

    fixture.naming.lock(&path("/f"), false).await.expect("lock");
    fixture.naming.unlock(&path("/f"), false).expect("unlock");

    // The copy failed, so a later write intent has nothing to invalidate.
    fixture.naming.lock(&path("/f"), true).await.expect("lock");
    fixture.naming.unlock(&path("/f"), true).expect("unlock");
    assert!(fixture.control.calls().is_empty());
}

#[tokio::test]
async fn exclusive_locks_do_not_count_reads() {
    let fixture = Fixture::with_threshold(2);
    fixture.naming.register(node(1), vec![path("/f")]).expect("register");
    fixture.naming.register(node(2), Vec::new()).expect("register");

    for _ in 0..4 {
        fixture.naming.lock(&path("/f"), true).await.expect("lock");
        fixture.naming.unlock(&path("/f"), true).expect("unlock");
    }
    assert!(fixture.control.calls().is_empty());
}
