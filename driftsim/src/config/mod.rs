mod client;

pub use self::client::{ClientConfig, Strategy};
