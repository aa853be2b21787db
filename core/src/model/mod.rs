//! Typed data model: the user-facing space configuration, the versioned
//! wire format, and the response shapes returned by Genie operations.

pub mod response;
pub mod space;
pub mod wire;

pub use response::{
    AskOutcome, AttachmentQuery, AttachmentText, ColumnInfo, ConversationList,
    ConversationSummary, GenieMessage, MessageAttachment, MessageError, MessageHandle,
    MessageStatus, OutcomeStatus, QueryResult, Space, SpaceList, SpaceSummary, TableMetadata,
    ColumnMetadata, Warehouse, MAX_RESULT_ROWS,
};
pub use space::{
    BenchmarkQuestion, ExampleQuery, Instruction, JoinSpec, SpaceConfig, SqlSnippet, SqlSnippets,
    TableRef,
};
pub use wire::{
    WireDataSources, WireQuestionConfig, WireSampleQuestion, WireSpace, WireTable,
    WireTextInstruction, WireInstructions, WIRE_VERSION,
};
