pub mod provider;
pub mod tautulli;

#[cfg(test)]
pub mod mock_tautulli;

pub use provider::MediaSource;
pub use tautulli::TautulliClient;
