//! Real-time sector streaming core: feeds CD-scrambled sector frames to an I2S transfer channel
//! while serving directory listing pages through a fixed sector of the stream

pub mod directory;
pub mod filelisting;
pub mod frame;
pub mod hardware;
pub mod listing;
pub mod mailbox;
pub mod streamer;

#[cfg(test)]
mod testutil;

pub use cdstreamer_config::{DataLocation, StreamerConfig};
