// micetro-api: Async Rust gateway for the Men&Mice Micetro IPAM REST API

pub mod classify;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod models;
pub mod query;
pub mod retry;
pub mod transport;

mod ipam;
mod ranges;
mod refs;

pub use classify::{ApiResponse, StatusClass, classify};
pub use connection::Connection;
pub use error::Error;
pub use gateway::{API_PREFIX, Gateway};
pub use ipam::ASSIGNED_FILTER;
pub use models::{
    DnsHost, DnsRecord, HostnamePolicy, IpamRecord, IpamRecordPage, ObjRef, Range, RangeList,
    RangeRef,
};
pub use query::{ApiFlag, Query};
pub use ranges::FreeAddressOptions;
pub use retry::{FailureKind, RetryPolicy};
pub use transport::{TlsMode, TransportConfig};
