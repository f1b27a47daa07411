mod channels;
mod provider;
mod speech;
mod state_store;

pub use channels::{Channel, ChannelCapabilities};
pub use provider::{complete, ModelProvider, ProviderResponse, TokenUsage};
pub use speech::{SpeechSynthesizer, SpeechTranscriber};
pub use state_store::{
    InteractionStore, NoteStore, QueryRows, QueryStore, QuotaPolicy, QuotaStore,
};
