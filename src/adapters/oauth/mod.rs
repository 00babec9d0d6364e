pub mod browser;
pub mod loopback;

pub use browser::SystemBrowser;
pub use loopback::CallbackServer;
