//! Beacon Core Library
//!
//! Client-side SDK that keeps a device's channel identity and profile
//! attributes registered with a remote registry, and polls a remote service
//! for typed configuration documents that are distributed to subscribers only
//! when they change.

pub mod beacon;
pub mod channel;
pub mod clock;
pub mod config;
pub mod device;
pub mod events;
pub mod job;
pub mod registry;
pub mod remotedata;
pub mod store;

pub use beacon::Beacon;
pub use channel::{
    AttributeMutation, ChannelPayload, ChannelRegistrar, PayloadExtender, RegistrationState,
    TagGroupMutation, TagOp, ACTION_UPDATE_CHANNEL,
};
pub use clock::{Clock, SystemClock};
pub use config::RuntimeConfig;
pub use device::{DeviceInfoSource, StaticDeviceInfo};
pub use events::{ChannelObserver, EventDispatcher, IdentifierBroadcast};
pub use job::{JobHandler, JobInfo, JobResult, JobScheduler};
pub use registry::{ChannelResponse, MockRegistryClient, RegistryClient, RemoteDataResponse, RequestError};
pub use remotedata::{
    FetchMetadata, PayloadCache, RemoteDataEngine, RemoteDataListener, RemoteDataPayload,
    ACTION_REFRESH,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StorageError};

/// SDK version reported in registration payloads and fetch requests.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
