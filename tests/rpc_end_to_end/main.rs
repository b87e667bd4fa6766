//! Full-stack exercise over TCP: the naming server's two listeners, the
//! client stubs, and in-memory storage servers speaking the storage
//! protocol.

#[path = "../../demos/local_cluster/node/mod.rs"]
mod node;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use dfs_naming::client::{RemoteStorage, ServiceClient};
use dfs_naming::naming::NamingServer;
use dfs_naming::path::FsPath;
use dfs_naming::server;
use dfs_naming::storage::DataPlane;
use dfs_naming::NamingError;

use node::MemStorage;

fn path(s: &str) -> FsPath {
    FsPath::parse(s).expect("parse path")
}

struct Cluster {
    service: SocketAddr,
    registration: SocketAddr,
}

impl Cluster {
    /// Starts a naming server on ephemeral ports.
    async fn start(threshold: u32) -> Self {
        let service = TcpListener::bind("127.0.0.1:0").await.expect("bind service");
        let registration =
            TcpListener::bind("127.0.0.1:0").await.expect("bind registration");
        let cluster = Self {
            service: service.local_addr().expect("service addr"),
            registration: registration.local_addr().expect("registration addr"),
        };
        let naming = Arc::new(NamingServer::new(threshold, Arc::new(RemoteStorage)));
        tokio::spawn(server::serve_service(service, naming.clone()));
        tokio::spawn(server::serve_registration(registration, naming));
        cluster
    }

    fn client(&self) -> ServiceClient {
        ServiceClient::new(self.service)
    }
}

#[tokio::test]
async fn registration_prunes_duplicates_locally() {
    let cluster = Cluster::start(20).await;
    let alpha = MemStorage::spawn().await.expect("spawn alpha");
    let beta = MemStorage::spawn().await.expect("spawn beta");

    alpha.seed(path("/shared/doc"), b"authoritative".to_vec()).await;
    beta.seed(path("/shared/doc"), b"stale".to_vec()).await;
    beta.seed(path("/only/beta"), b"unique".to_vec()).await;

    alpha.register(cluster.registration).await.expect("register alpha");
    beta.register(cluster.registration).await.expect("register beta");

    assert!(alpha.contains(&path("/shared/doc")).await);
    assert!(!beta.contains(&path("/shared/doc")).await);
    assert!(beta.contains(&path("/only/beta")).await);

    let client = cluster.client();
    assert!(client.is_directory(&path("/shared")).await.expect("is_directory"));
    assert_eq!(client.list(&path("/only")).await.expect("list"), vec!["beta"]);
}

#[tokio::test]
async fn bytes_flow_through_the_data_plane() {
    let cluster = Cluster::start(20).await;
    let storage = MemStorage::spawn().await.expect("spawn storage");
    storage.register(cluster.registration).await.expect("register");

    let client = cluster.client();
    assert!(client.create_file(&path("/notes")).await.expect("create"));

    let endpoint = client.get_storage(&path("/notes")).await.expect("get_storage");
    assert_eq!(endpoint, storage.data_addr());

    let remote = RemoteStorage;
    client.lock(&path("/notes"), true).await.expect("lock");
    remote.write(endpoint, &path("/notes"), 0, b"first line").await.expect("write");
    client.unlock(&path("/notes"), true).await.expect("unlock");

    client.lock(&path("/notes"), false).await.expect("lock");
    assert_eq!(remote.size(endpoint, &path("/notes")).await.expect("size"), 10);
    let bytes = remote.read(endpoint, &path("/notes"), 0, 10).await.expect("read");
    client.unlock(&path("/notes"), false).await.expect("unlock");
    assert_eq!(bytes, b"first line");
}

#[tokio::test]
async fn hot_files_replicate_across_storage_servers() {
    let cluster = Cluster::start(5).await;
    let alpha = MemStorage::spawn().await.expect("spawn alpha");
    let beta = MemStorage::spawn().await.expect("spawn beta");

    let blob: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    alpha.seed(path("/big/blob"), blob.clone()).await;
    alpha.register(cluster.registration).await.expect("register alpha");
    beta.register(cluster.registration).await.expect("register beta");

    let client = cluster.client();
    for _ in 0..5 {
        client.lock(&path("/big/blob"), false).await.expect("lock");
        client.unlock(&path("/big/blob"), false).await.expect("unlock");
    }

    // The chunked copy rebuilt the full file on the second server.
    assert!(beta.contains(&path("/big/blob")).await);
    let bytes = RemoteStorage
        .read(beta.data_addr(), &path("/big/blob"), 0, blob.len() as u32)
        .await
        .expect("read copy");
    assert_eq!(bytes, blob);
}

#[tokio::test]
async fn delete_reaches_every_host() {
    let cluster = Cluster::start(1).await;
    let alpha = MemStorage::spawn().await.expect("spawn alpha");
    let beta = MemStorage::spawn().await.expect("spawn beta");
    alpha.seed(path("/tmp/junk"), b"x".to_vec()).await;
    alpha.register(cluster.registration).await.expect("register alpha");
    beta.register(cluster.registration).await.expect("register beta");

    let client = cluster.client();
    // One shared window copies the file onto beta.
    client.lock(&path("/tmp/junk"), false).await.expect("lock");
    client.unlock(&path("/tmp/junk"), false).await.expect("unlock");
    assert!(beta.contains(&path("/tmp/junk")).await);

    assert!(client.delete(&path("/tmp")).await.expect("delete"));
    assert!(!alpha.contains(&path("/tmp/junk")).await);
    assert!(!beta.contains(&path("/tmp/junk")).await);
    assert!(matches!(
        client.is_directory(&path("/tmp")).await,
        Err(NamingError::NotFound)
    ));
}

#[tokio::test]
async fn errors_cross_the_wire_intact() {
    let cluster = Cluster::start(20).await;
    let client = cluster.client();

    assert!(matches!(
        client.get_storage(&path("/ghost")).await,
        Err(NamingError::NotFound)
    ));
    assert!(matches!(
        client.create_file(&path("/somewhere/file")).await,
        Err(NamingError::NotFound)
    ));
    assert!(matches!(
        client.unlock(&path("/ghost"), false).await,
        Err(NamingError::InvalidState)
    ));

    let storage = MemStorage::spawn().await.expect("spawn storage");
    storage.register(cluster.registration).await.expect("register");
    assert!(matches!(
        client.create_file(&path("/dir/file")).await,
        Err(NamingError::NotFound)
    ));
    assert!(client.create_file(&path("/file")).await.expect("create"));
}
