//! Audio signal chain: decoding, the equalizer cascade, and output routing.

mod backend;
mod chain;
mod filter;
mod format;
mod output;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{MediaDecoder, OutputDevice};
pub use chain::{AudioSignalChain, ChainEvent, LoadToken};
pub use filter::{BAND_COUNT, BAND_FREQUENCIES_HZ};
pub use format::AudioFormat;
pub use output::{FileDecoder, RodioOutput};

/// The chain as wired in the running player.
pub type RodioChain = AudioSignalChain<FileDecoder, RodioOutput>;

#[cfg(test)]
mod tests;
