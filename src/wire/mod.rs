pub mod buffer;
pub mod courier;
pub mod frame;
pub mod gather;
pub mod receiver;
pub mod sender;
pub mod streamer;
