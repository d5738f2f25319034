//! Testing utilities for the synthesis workspace
//!
//! Shared fakes, fixtures, and builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use synth_attribution::{build_source_map, AdditionalSource, ReportDescriptor, SourceMap};
use synth_core::{GenerationError, PostProcessConfig, PostProcessor, SharedGenerator, TextGenerator};

/// Generator that replays scripted replies and records every prompt
#[derive(Debug, Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Generator whose first call returns `text`
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        let fake = Self::default();
        fake.replies.lock().push_back(Ok(text.into()));
        Arc::new(fake)
    }

    /// Generator whose first call fails with `error`
    pub fn failing(error: GenerationError) -> Arc<Self> {
        let fake = Self::default();
        fake.replies.lock().push_back(Err(error));
        Arc::new(fake)
    }

    pub fn push_reply(&self, reply: Result<String, GenerationError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("no scripted reply left".to_string())))
    }
}

/// Generator that fails every call with the same error
#[derive(Debug)]
pub struct FailingGenerator {
    error: GenerationError,
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn new(error: GenerationError) -> Arc<Self> {
        Arc::new(Self {
            error,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

pub fn reports(names: &[&str]) -> Vec<ReportDescriptor> {
    names.iter().map(|name| ReportDescriptor::new(*name)).collect()
}

pub fn labeled_sources(labels: &[&str]) -> Vec<AdditionalSource> {
    labels.iter().map(|label| AdditionalSource::labeled(*label)).collect()
}

/// `GPT-4`, `Claude`, plus user source `Wikipedia`
pub fn sample_source_map() -> SourceMap {
    build_source_map(&reports(&["GPT-4", "Claude"]), &labeled_sources(&["Wikipedia"]))
}

pub fn setup_processor(generator: SharedGenerator) -> PostProcessor {
    PostProcessor::new(PostProcessConfig::new())
        .expect("default config is valid")
        .with_generator(generator)
}

/// Fully attributed document against [`sample_source_map`]
pub const VALID_DOCUMENT: &str = "\
# Market Overview

## Background
Demand grew steadily across regions.
Attribution: Primary=S1,S2; Secondary=U1; Constraints=; UNK=false

## Findings
Adoption is concentrated in two segments.
Attribution: Primary=S2; Secondary=S1; Constraints=; UNK=false

## Limitations
Data for 2023 is incomplete.
Attribution: Primary=; Secondary=; Constraints=S1,U1; UNK=true
";

/// Same content with no attribution lines at all
pub const UNATTRIBUTED_DOCUMENT: &str = "\
# Market Overview

## Background
Demand grew steadily across regions.

## Findings
Adoption is concentrated in two segments.

## Limitations
Data for 2023 is incomplete.
";

/// Mixed defects: malformed line, unknown id, missing line
pub const DEFECTIVE_DOCUMENT: &str = "\
## Background
Demand grew steadily across regions.
Attribution: Primary=s1; Secondary=; Constraints=

## Findings
Adoption is concentrated in two segments.
Attribution: Primary=S9; Secondary=; Constraints=; UNK=false

## Limitations
Data for 2023 is incomplete.
";
