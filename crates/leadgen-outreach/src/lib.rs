pub mod bridge;
pub mod error;
pub mod generate;
pub mod mail;
pub mod message;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod recorder;
pub mod stats;

pub use bridge::{BridgeClient, Messenger};
pub use error::{OutreachError, RecorderError};
pub use generate::{GeneratorClient, MessageGenerator};
pub use mail::{MailClient, Mailer};
pub use message::{AgencyIdentity, Message, Tone};
pub use orchestrator::{Orchestrator, OrchestratorOptions, RunInProgress, RunReport};
pub use outcome::{AttemptStatus, Channel, ChannelAttempt, ContactOutcome};
pub use progress::{ProgressEvent, ProgressSink};
pub use recorder::{JsonlRecorder, LeadRecorder};
pub use stats::{RunStats, RunStatsSnapshot};
