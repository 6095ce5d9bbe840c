//! Frame composition and the panel sinks frames are written to.

pub mod composer;
pub mod fonts;
pub mod frame;
pub mod glyphs;
pub mod icons;
pub mod rotation;
pub mod sink;

pub use composer::{FrameComposer, LineTexts};
pub use frame::Frame;
pub use icons::{classify, IconState, IconStates, Metric};
pub use rotation::{RotationPhase, RotationScheduler};
pub use sink::{DisplaySink, MemorySink, OledSink};
