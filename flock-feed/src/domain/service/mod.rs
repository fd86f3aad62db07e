pub mod feed_assembler;

#[cfg(test)]
mod feed_assembler_test;

pub use feed_assembler::{
    Candidate, CandidateOrigin, FeedAssembler, merge_candidates, order_candidates, project_item,
};
