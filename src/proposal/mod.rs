//! Two-phase code proposals: stage generator output, then accept or reject.

pub mod lifecycle;
pub mod parser;
pub mod store;

pub use lifecycle::{
    render_proposal, AcceptReport, AcceptRetention, FileOutcome, FileWriteOutcome,
    ProposalManager,
};
pub use parser::{parse_proposal, FileUnit, ParsedProposal, SkipReason, SkippedSection};
pub use store::{IdSource, Proposal, ProposalId, ProposalStore, RandomIdSource};
