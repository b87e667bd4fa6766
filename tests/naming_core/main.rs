mod common;
mod locking;
mod replication;
