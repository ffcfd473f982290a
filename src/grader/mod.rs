//! Grading consumer layered over the shadow-aware index.
//!
//! The grading view's structure is addressed by convention, not by API:
//! every logical problem contributes two consecutive section markers, a
//! problem's step list is an unbounded forward scan that runs into later
//! problems, and the first input under a step is the grade control (a
//! second one, when present, is the feedback control and is left alone).
//! This module encodes those conventions and keeps the index honest with a
//! single rebuild-and-retry when a lookup comes back unexpectedly empty.

use crate::browser::BrowserSession;
use crate::dom::{DomTree, EntryId};
use crate::error::{GraderError, Result};

/// Tag names that anchor the grading structure on the page. These are page
/// business data rather than engine logic, so they are configurable; the
/// defaults target Brightspace's consistent-evaluation quiz view.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Marker tag of a top-level scoring section; two per logical problem
    pub section_tag: String,

    /// Marker tag of one step result inside a problem
    pub step_tag: String,

    /// Tag of the grade control under a step
    pub input_tag: String,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            section_tag: "d2l-consistent-evaluation-quizzing-section".to_string(),
            step_tag: "d2l-consistent-evaluation-quizzing-attempt-result".to_string(),
            input_tag: "input".to_string(),
        }
    }
}

impl GraderConfig {
    /// Create a config with the default tag names
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the section marker tag
    pub fn section_tag(mut self, tag: impl Into<String>) -> Self {
        self.section_tag = tag.into();
        self
    }

    /// Builder method: set the step marker tag
    pub fn step_tag(mut self, tag: impl Into<String>) -> Self {
        self.step_tag = tag.into();
        self
    }

    /// Builder method: set the grade input tag
    pub fn input_tag(mut self, tag: impl Into<String>) -> Self {
        self.input_tag = tag.into();
        self
    }
}

/// Page access the grader needs: fresh snapshots and input I/O.
///
/// Implemented by [`BrowserSession`] for live pages; test doubles implement
/// it offline.
pub trait PageBackend {
    /// Capture and index a fresh snapshot of the page, shadow trees included
    fn snapshot(&self) -> Result<DomTree>;

    /// Current presentation value of the input at `selector`; `None` when
    /// the selector no longer resolves on the live page
    fn read_value(&self, selector: &str) -> Result<Option<String>>;

    /// Set the input's value and fire the change notifications a framework
    /// listens for; `false` when the selector no longer resolves
    fn write_value(&self, selector: &str, value: &str) -> Result<bool>;
}

impl PageBackend for BrowserSession {
    fn snapshot(&self) -> Result<DomTree> {
        self.extract_dom()
    }

    fn read_value(&self, selector: &str) -> Result<Option<String>> {
        BrowserSession::read_value(self, selector)
    }

    fn write_value(&self, selector: &str, value: &str) -> Result<bool> {
        BrowserSession::write_value(self, selector, value)
    }
}

/// Outcome summary of a [`Grader::set_grades`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Values written to a grade input
    pub applied: usize,

    /// Sentinel positions left untouched
    pub skipped: usize,

    /// Steps whose grade input was missing
    pub failed: usize,
}

/// Grading consumer: addresses problems and steps through the index and
/// reads or writes grade inputs through a [`PageBackend`].
pub struct Grader<B> {
    backend: B,
    config: GraderConfig,
    tree: DomTree,
}

impl<B: PageBackend> Grader<B> {
    /// Snapshot the page once and index it
    pub fn new(backend: B, config: GraderConfig) -> Result<Self> {
        let tree = backend.snapshot()?;
        Ok(Self { backend, config, tree })
    }

    /// Discard the snapshot and index and start over from the live page
    pub fn refresh(&mut self) -> Result<()> {
        self.tree = self.backend.snapshot()?;
        Ok(())
    }

    /// The current snapshot and index
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Section marker entries, in document order
    pub fn sections(&self) -> Vec<EntryId> {
        self.tree
            .index
            .find_by_tag(&self.config.section_tag)
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    /// Number of logical problems on the page (two section markers each)
    pub fn problem_count(&self) -> usize {
        self.sections().len() / 2
    }

    /// Entry handle of the 1-based `num`th logical problem.
    ///
    /// Each problem contributes two consecutive section markers; the first
    /// of the pair is the one the grading view anchors on, so problem `num`
    /// sits at marker position `2 * (num - 1)`. An empty marker list
    /// triggers exactly one snapshot rebuild before giving up.
    pub fn problem(&mut self, num: usize) -> Result<EntryId> {
        let mut sections = self.sections();
        if sections.is_empty() {
            log::warn!("no <{}> markers in the index, rebuilding snapshot", self.config.section_tag);
            self.refresh()?;
            sections = self.sections();
            if sections.is_empty() {
                return Err(GraderError::StaleIndex(format!(
                    "no <{}> markers found after rebuild",
                    self.config.section_tag
                )));
            }
        }

        if num == 0 || sections.len() < num * 2 {
            return Err(GraderError::RangeExceeded { requested: num, available: sections.len() / 2 });
        }

        Ok(sections[(num - 1) * 2])
    }

    /// Step marker entries following the problem, in document order.
    ///
    /// The list is unbounded and runs into later problems; index into it
    /// only as far as the current problem's own step count.
    pub fn steps(&self, problem: EntryId) -> Vec<EntryId> {
        self.tree
            .index
            .find_following_tag(problem, &self.config.step_tag)
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    /// Read the grade currently shown for a step
    pub fn get_grade(&mut self, problem_num: usize, step_num: usize) -> Result<f64> {
        let step = self.step(problem_num, step_num)?;
        let selector = self.grade_input_selector(step)?;
        // The index knew the input; if the live page no longer resolves the
        // selector the page has changed underneath the snapshot
        let value = self
            .backend
            .read_value(&selector)?
            .ok_or(GraderError::NotFound(selector))?;
        value
            .trim()
            .parse()
            .map_err(|_| GraderError::ValueParseFailed(value))
    }

    /// Write one grade
    pub fn set_grade(&mut self, problem_num: usize, step_num: usize, grade: f64) -> Result<()> {
        let step = self.step(problem_num, step_num)?;
        self.apply_to_step(step, grade)
    }

    /// Apply a grade matrix in one pass.
    ///
    /// Rows flatten in order and flat position `i` goes to step `i + 1` of
    /// problem 1, whose following-scan step list covers every step in the
    /// form. Negative values are the skip sentinel. When the flattened list
    /// outruns the available steps the batch aborts before touching any
    /// input; a step without a grade input is logged and the batch
    /// continues with the next value.
    pub fn set_grades(&mut self, grades: &[Vec<f64>]) -> Result<BatchReport> {
        let flat: Vec<f64> = grades.iter().flatten().copied().collect();

        let problem = self.problem(1)?;
        let steps = self.steps(problem);
        if flat.len() > steps.len() {
            return Err(GraderError::RangeExceeded { requested: flat.len(), available: steps.len() });
        }

        let mut report = BatchReport::default();
        for (i, grade) in flat.iter().enumerate() {
            if *grade < 0.0 {
                report.skipped += 1;
                continue;
            }
            match self.apply_to_step(steps[i], *grade) {
                Ok(()) => report.applied += 1,
                Err(GraderError::MissingControl(selector)) | Err(GraderError::NotFound(selector)) => {
                    log::error!("no grade input for step {} ({}), continuing", i + 1, selector);
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Resolve the 1-based step within the 1-based problem
    fn step(&mut self, problem_num: usize, step_num: usize) -> Result<EntryId> {
        let problem = self.problem(problem_num)?;
        let steps = self.steps(problem);
        if step_num == 0 || steps.len() < step_num {
            return Err(GraderError::RangeExceeded { requested: step_num, available: steps.len() });
        }
        Ok(steps[step_num - 1])
    }

    /// Selector of the grade input under a step: the first input in the
    /// step's subtree. A second input, when present, is the feedback control
    /// and is not touched.
    fn grade_input_selector(&self, step: EntryId) -> Result<String> {
        let inputs = self.tree.index.find_descendants_by_tag(step, &self.config.input_tag);
        match inputs.first() {
            Some(entry) => Ok(entry.selector.clone()),
            None => {
                let step_selector = self
                    .tree
                    .index
                    .entry(step)
                    .map(|e| e.selector.clone())
                    .unwrap_or_default();
                Err(GraderError::MissingControl(step_selector))
            }
        }
    }

    fn apply_to_step(&mut self, step: EntryId, grade: f64) -> Result<()> {
        let selector = self.grade_input_selector(step)?;
        if !self.backend.write_value(&selector, &format_grade(grade))? {
            // Indexed but gone from the live page
            return Err(GraderError::NotFound(selector));
        }
        Ok(())
    }
}

/// Render a grade the way a typed value would appear in the input: integral
/// grades without a decimal point
fn format_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        format!("{}", grade as i64)
    } else {
        grade.to_string()
    }
}
