//! Runs a whole cluster in one process: the naming server plus two
//! in-memory storage servers, then drives the client surface end to end.

pub mod node;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use dfs_naming::client::{RemoteStorage, ServiceClient};
use dfs_naming::naming::NamingServer;
use dfs_naming::path::FsPath;
use dfs_naming::server;
use dfs_naming::storage::DataPlane;
use dfs_naming::Config;

fn path(s: &str) -> FsPath {
    FsPath::parse(s).expect("parse path")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let service = TcpListener::bind("127.0.0.1:0").await.expect("bind service");
    let registration = TcpListener::bind("127.0.0.1:0").await.expect("bind registration");
    let service_addr = service.local_addr().expect("service addr");
    let registration_addr = registration.local_addr().expect("registration addr");

    let naming = Arc::new(NamingServer::new(
        Config::default().replication_threshold,
        Arc::new(RemoteStorage),
    ));
    tokio::spawn(server::serve_service(service, naming.clone()));
    tokio::spawn(server::serve_registration(registration, naming));

    let alpha = node::MemStorage::spawn().await.expect("spawn storage alpha");
    let beta = node::MemStorage::spawn().await.expect("spawn storage beta");
    alpha.seed(path("/docs/readme"), b"hello from alpha".to_vec()).await;
    beta.seed(path("/docs/readme"), b"stale duplicate".to_vec()).await;

    alpha.register(registration_addr).await.expect("register alpha");
    beta.register(registration_addr).await.expect("register beta");
    println!("beta kept its duplicate: {}", beta.contains(&path("/docs/readme")).await);

    let client = ServiceClient::new(service_addr);
    println!("/docs is a directory: {}", client.is_directory(&path("/docs")).await.expect("is_directory"));

    client.create_directory(&path("/notes")).await.expect("mkdir");
    client.create_file(&path("/notes/todo")).await.expect("create");
    println!("root lists: {:?}", client.list(&FsPath::root()).await.expect("list"));

    let remote = RemoteStorage;
    client.lock(&path("/notes/todo"), true).await.expect("lock");
    let endpoint = client.get_storage(&path("/notes/todo")).await.expect("get_storage");
    remote.write(endpoint, &path("/notes/todo"), 0, b"ship the demo").await.expect("write");
    client.unlock(&path("/notes/todo"), true).await.expect("unlock");

    client.lock(&path("/notes/todo"), false).await.expect("lock");
    let bytes = remote.read(endpoint, &path("/notes/todo"), 0, 13).await.expect("read");
    client.unlock(&path("/notes/todo"), false).await.expect("unlock");
    println!("read back: {}", String::from_utf8_lossy(&bytes));

    // Hammer one file with shared locks until the replication policy copies
    // it to the second storage server.
    for _ in 0..Config::default().replication_threshold {
        client.lock(&path("/docs/readme"), false).await.expect("lock");
        client.unlock(&path("/docs/readme"), false).await.expect("unlock");
    }
    println!(
        "replicated onto beta: {}",
        beta.contains(&path("/docs/readme")).await
    );

    client.delete(&path("/docs")).await.expect("delete");
    println!("alpha still hosts /docs/readme: {}", alpha.contains(&path("/docs/readme")).await);
}
