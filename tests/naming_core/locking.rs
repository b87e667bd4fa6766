use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use dfs_naming::NamingError;

use super::common::{node, path, Fixture};

const SHORT: Duration = Duration::from_millis(50);
const LONG: Duration = Duration::from_secs(5);

#[tokio::test]
async fn lock_requires_a_known_path() {
    let fixture = Fixture::new();
    assert!(matches!(
        fixture.naming.lock(&path("/ghost"), false).await,
        Err(NamingError::NotFound)
    ));
}

#[tokio::test]
async fn unlock_validates_holder_state() {
    let fixture = Fixture::new();
    fixture.naming.create_directory(&path("/dir")).expect("mkdir");

    assert!(matches!(
        fixture.naming.unlock(&path("/dir"), false),
        Err(NamingError::InvalidState)
    ));

    fixture.naming.lock(&path("/dir"), true).await.expect("lock");
    assert!(matches!(
        fixture.naming.unlock(&path("/dir"), false),
        Err(NamingError::InvalidState)
    ));
    fixture.naming.unlock(&path("/dir"), true).expect("unlock");
}

#[tokio::test]
async fn exclusive_ancestor_blocks_shared_descendant() {
    let fixture = Fixture::new();
    fixture.naming.register(node(1), vec![path("/a/b")]).expect("register");

    fixture.naming.lock(&path("/a"), true).await.expect("lock /a");

    let naming = Arc::clone(&fixture.naming);
    let mut blocked = tokio::spawn(async move {
        naming.lock(&path("/a/b"), false).await.expect("lock /a/b");
        naming.unlock(&path("/a/b"), false).expect("unlock /a/b");
    });

    // The descendant acquire must still be pending while /a is held.
    assert!(timeout(SHORT, &mut blocked).await.is_err());

    fixture.naming.unlock(&path("/a"), true).expect("unlock /a");
    timeout(LONG, blocked).await.expect("blocked task finishes").expect("join");
}

#[tokio::test]
async fn second_writer_waits_for_the_first() {
    let fixture = Fixture::new();
    fixture.naming.register(node(1), vec![path("/w")]).expect("register");

    fixture.naming.lock(&path("/w"), true).await.expect("first lock");

    let naming = Arc::clone(&fixture.naming);
    let mut second = tokio::spawn(async move {
        naming.lock(&path("/w"), true).await.expect("second lock");
        naming.unlock(&path("/w"), true).expect("second unlock");
    });
    assert!(timeout(SHORT, &mut second).await.is_err());

    fixture.naming.unlock(&path("/w"), true).expect("first unlock");
    timeout(LONG, second).await.expect("second writer finishes").expect("join");
}

#[tokio::test]
async fn shared_holders_coexist() {
    let fixture = Fixture::new();
    fixture.naming.register(node(1), vec![path("/r")]).expect("register");

    fixture.naming.lock(&path("/r"), false).await.expect("first");
    // A second shared acquire goes through while the first is held.
    timeout(LONG, fixture.naming.lock(&path("/r"), false))
        .await
        .expect("no blocking")
        .expect("second");

    fixture.naming.unlock(&path("/r"), false).expect("unlock first");
    fixture.naming.unlock(&path("/r"), false).expect("unlock second");
}
