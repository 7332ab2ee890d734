pub mod client;
pub mod device;
pub mod error;
pub mod measurement;
pub mod poller;
pub mod view;

pub use client::{MeasurementSource, ProbeClient};
pub use error::PollError;
pub use measurement::{ChannelReading, MeasurementRecord, NUM_OF_CHANNELS_TO_DISPLAY};
pub use poller::{PollEvent, PollSettings, PollState, Poller, PollerHandle};
pub use view::{ViewBatch, ViewSink, ViewState};
