pub mod clock;
pub mod random;

pub use clock::{Clock, ManualClock, SystemClock};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
