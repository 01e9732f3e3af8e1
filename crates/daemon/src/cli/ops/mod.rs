pub mod daemon;
pub mod entry;
pub mod health;
pub mod init;
pub mod version;

pub use daemon::Daemon;
pub use entry::Entry;
pub use health::Health;
pub use init::Init;
pub use version::Version;
