pub mod data_uri;
pub mod error;
pub mod frames;
pub mod message;
pub mod normalizer;
pub mod stt;

pub use data_uri::DataUri;
pub use error::MediaError;
pub use frames::{describe_frames, FrameExtractor, KeyFrame, UnavailableExtractor};
pub use message::{IncomingMessage, Role};
pub use normalizer::Normalizer;
pub use stt::TranscriberChain;
