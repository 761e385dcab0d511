#[cfg(target_family = "unix")]
mod unix;

#[cfg(target_family = "unix")]
pub use self::unix::{rlim_t, raise_nofile};
