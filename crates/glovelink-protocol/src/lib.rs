pub mod codec;
pub mod decoder;
pub mod reassembler;

pub use codec::GloveCodec;
pub use decoder::{decode, decode_at, encode_frame};
pub use reassembler::{FrameReassembler, FramingMode};
