use std::collections::HashMap;

use super::conversion::CONVERSION_BOXES;
use super::copy::{COPY_FILE, COPY_FILES, DumpResultsBox};
use super::data::{ExtractArchiveBox, FileInBox, FilesInBox, SubmittedFilesBox};
use super::judge::{CustomJudgeBox, JudgeBox};
use super::toolchain::{COMPILATION_BOXES, EXECUTION_BOXES};
use super::{BoxType, PipelineBox};
use crate::error::PipelineError;

/// Box types by type tag.
///
/// Built once with [`BoxRegistry::standard`] and handed to the validator and
/// the compiler; it is never mutated afterwards.
pub struct BoxRegistry {
    types: HashMap<&'static str, &'static dyn BoxType>,
}

impl BoxRegistry {
    pub fn empty() -> Self {
        BoxRegistry {
            types: HashMap::new(),
        }
    }

    /// Every box type the worker supports.
    pub fn standard() -> Self {
        let mut registry = BoxRegistry::empty();
        registry.register(&FileInBox);
        registry.register(&FilesInBox);
        registry.register(&SubmittedFilesBox);
        registry.register(&ExtractArchiveBox);
        registry.register(&JudgeBox);
        registry.register(&CustomJudgeBox);
        registry.register(&COPY_FILE);
        registry.register(&COPY_FILES);
        registry.register(&DumpResultsBox);
        for box_type in &COMPILATION_BOXES {
            registry.register(box_type);
        }
        for box_type in &EXECUTION_BOXES {
            registry.register(box_type);
        }
        for box_type in &CONVERSION_BOXES {
            registry.register(box_type);
        }
        tracing::debug!(count = registry.types.len(), "box registry ready");
        registry
    }

    pub fn register(&mut self, box_type: &'static dyn BoxType) {
        self.types.insert(box_type.type_tag(), box_type);
    }

    pub fn get(&self, tag: &str) -> Option<&'static dyn BoxType> {
        self.types.get(tag).copied()
    }

    /// Type of a pipeline box; fails with `UnknownBoxType` naming the box.
    pub fn type_of(&self, instance: &PipelineBox) -> Result<&'static dyn BoxType, PipelineError> {
        self.get(&instance.box_type)
            .ok_or_else(|| PipelineError::UnknownBoxType {
                box_name: instance.name.clone(),
                box_type: instance.box_type.clone(),
            })
    }

    /// A fresh box of type `tag` with its default ports.
    pub fn instantiate(&self, tag: &str, name: Option<&str>) -> Option<PipelineBox> {
        self.get(tag).map(|t| PipelineBox::from_type(t, name))
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.types.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for BoxRegistry {
    fn default() -> Self {
        BoxRegistry::standard()
    }
}
