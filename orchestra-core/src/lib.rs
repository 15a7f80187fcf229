#![deny(missing_docs)]
//! # orchestra-core — shared types for the orchestration core
//!
//! Defines the data model (§3) and collaborator contracts (§6) shared by
//! every other `orchestra-*` crate: typed identifiers, the closed intent
//! set, complexity and budget types, compression and routing types, the
//! per-execution telemetry dossier, and the six collaborator traits
//! (`LlmProvider`, `ConfigTable`, `StepExecutionTable`, `AgentAisStore`,
//! `MemoryStore`, `AuditSink`).
//!
//! This crate owns no business logic — only the shapes every component
//! agrees on.

pub mod budget;
pub mod collaborators;
pub mod complexity;
pub mod compression;
pub mod config;
pub mod duration;
pub mod id;
pub mod intent;
pub mod metadata;
pub mod routing;
pub mod step;

pub use budget::TokenBudget;
pub use collaborators::{
    AgentAisStore, AuditEvent, AuditSeverity, AuditSink, ChatMessage, ChatMetadata, ChatResponse,
    ChatRole, ChatUsage, LlmProvider, MemoryBlock, MemoryStore, ProviderError, StepExecutionRow,
    StepExecutionTable,
};
pub use complexity::{AgentAis, StepComplexity, StepComplexityFactors, StepComplexityRaw};
pub use compression::{Aggressiveness, CompressionPolicy, CompressionResult, CompressionStrategy};
pub use config::{ConfigTable, FeatureFlags};
pub use duration::DurationMs;
pub use id::{AgentId, ExecutionId, StepId, UserId, WorkflowId};
pub use intent::{ClassificationMethod, Intent, IntentClassification, Recommendation};
pub use metadata::{AggregatedMetrics, HandlerResult, OrchestrationMetadata, StepMetadata, TokenUsage};
pub use routing::{RoutingDecision, Tier};
pub use step::{Step, StepKind, Workflow};
