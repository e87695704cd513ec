//! Incremental streaming render.
//!
//! Every fragment re-renders the whole accumulated text. Only lines that are unlikely to change
//! any more are printed: the last `held_out_lines` lines of each render are withheld until the
//! stream completes. Printed lines are never revised.
//!
//! Renders may shrink mid-stream (a paragraph turning into a setext heading, a block
//! reflowing). Line indices that were already printed are never printed again, so the
//! reconciler keeps a high-water mark of emitted indices on top of the pure window ranges.

use std::io::{self, Write};
use std::ops::Range;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::render::{RenderOptions, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    Streaming,
    Completed,
    Failed,
}

impl ReconcilerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Lines of the current render to print, given the previous render's length.
///
/// The range is empty when the stable part did not grow, and always lies within
/// `0..current_len`.
pub fn emit_range(previous_len: usize, current_len: usize, held: usize) -> Range<usize> {
    let start = previous_len.saturating_sub(held).min(current_len);
    let end = current_len.saturating_sub(held);
    if end <= start {
        start..start
    } else {
        start..end
    }
}

/// Lines still withheld from a render of `len` lines.
pub fn flush_range(len: usize, held: usize) -> Range<usize> {
    len.saturating_sub(held)..len
}

pub struct StreamReconciler<R, W> {
    renderer: R,
    sink: W,
    options: RenderOptions,
    held_out_lines: usize,
    accumulated: String,
    rendered: Vec<String>,
    /// Every line index below this one has been printed.
    emitted: usize,
    fragments: usize,
    state: ReconcilerState,
}

impl<R: Renderer, W: Write> StreamReconciler<R, W> {
    pub fn new(renderer: R, sink: W, options: RenderOptions, held_out_lines: usize) -> Self {
        Self {
            renderer,
            sink,
            options,
            held_out_lines,
            accumulated: String::new(),
            rendered: Vec::new(),
            emitted: 0,
            fragments: 0,
            state: ReconcilerState::Idle,
        }
    }

    pub fn from_config(renderer: R, sink: W, options: RenderOptions, config: &StreamConfig) -> Self {
        Self::new(renderer, sink, options, config.held_out_lines)
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// The most recent render.
    pub fn rendered(&self) -> &[String] {
        &self.rendered
    }

    /// Number of leading line indices already printed.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn fragments_seen(&self) -> usize {
        self.fragments
    }

    pub fn held_out_lines(&self) -> usize {
        self.held_out_lines
    }

    /// Feeds one line of source output. Returns the range of rendered lines that was printed.
    pub fn on_fragment(&mut self, fragment: &str) -> Result<Range<usize>, StreamError> {
        if self.state.is_terminal() {
            return Err(StreamError::InvalidState {
                operation: "feed",
                state: self.state,
            });
        }

        let fragment_index = self.fragments;
        self.state = ReconcilerState::Streaming;
        self.fragments += 1;
        self.accumulated.push_str(fragment);
        self.accumulated.push('\n');

        let current = match self.renderer.render(&self.accumulated, &self.options) {
            Ok(lines) => lines,
            Err(source) => {
                self.state = ReconcilerState::Failed;
                tracing::debug!(fragment_index, error = %source, "render failed mid-stream");
                return Err(StreamError::Render {
                    fragment_index,
                    source,
                });
            }
        };

        if current == self.rendered {
            return Ok(0..0);
        }

        let window = emit_range(self.rendered.len(), current.len(), self.held_out_lines);
        let range = self.unprinted(window, current.len());
        if let Err(source) = write_lines(&mut self.sink, &current[range.clone()]) {
            self.state = ReconcilerState::Failed;
            return Err(StreamError::Output(source));
        }
        self.emitted = self.emitted.max(range.end);
        tracing::trace!(
            fragment_index,
            rendered = current.len(),
            emitted = range.len(),
            "reconciled fragment"
        );
        self.rendered = current;
        Ok(range)
    }

    /// Marks the session as failed. Withheld lines are dropped.
    pub fn fail(&mut self) {
        self.state = ReconcilerState::Failed;
    }

    /// Prints the withheld tail and returns the full response text without trailing newlines.
    pub fn on_complete(mut self) -> Result<String, StreamError> {
        if self.state.is_terminal() {
            return Err(StreamError::InvalidState {
                operation: "complete",
                state: self.state,
            });
        }

        let len = self.rendered.len();
        let range = self.unprinted(flush_range(len, self.held_out_lines), len);
        if let Err(source) = write_lines(&mut self.sink, &self.rendered[range.clone()]) {
            self.state = ReconcilerState::Failed;
            return Err(StreamError::Output(source));
        }
        self.emitted = self.emitted.max(range.end);
        self.state = ReconcilerState::Completed;
        tracing::debug!(
            fragments = self.fragments,
            rendered = self.rendered.len(),
            "stream completed"
        );

        let trimmed_len = self.accumulated.trim_end_matches(['\n', '\r']).len();
        self.accumulated.truncate(trimmed_len);
        Ok(self.accumulated)
    }

    /// Narrows `window` to indices past the high-water mark, within a render of `len` lines.
    fn unprinted(&self, window: Range<usize>, len: usize) -> Range<usize> {
        let start = window.start.max(self.emitted).min(len);
        let end = window.end.max(start).min(len);
        start..end
    }

    /// Drives the reconciler over `source` to completion.
    ///
    /// A source error stops the session without flushing the withheld lines.
    pub fn run<I>(mut self, source: I) -> Result<String, StreamError>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        for item in source {
            match item {
                Ok(fragment) => {
                    self.on_fragment(&fragment)?;
                }
                Err(source) => {
                    let fragment_index = self.fragments;
                    self.fail();
                    return Err(StreamError::Source {
                        fragment_index,
                        source,
                    });
                }
            }
        }
        self.on_complete()
    }
}

fn write_lines<W: Write>(sink: &mut W, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        writeln!(sink, "{line}")?;
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{emit_range, flush_range, ReconcilerState, StreamReconciler};
    use crate::error::{RenderError, StreamError};
    use crate::render::{RenderOptions, Renderer};

    /// Returns scripted renders in order, ignoring the input text.
    struct Scripted {
        renders: RefCell<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new(renders: &[&[&str]]) -> Self {
            let renders = renders
                .iter()
                .rev()
                .map(|lines| lines.iter().map(|line| line.to_string()).collect())
                .collect();
            Self {
                renders: RefCell::new(renders),
            }
        }
    }

    impl Renderer for Scripted {
        fn render(&self, _text: &str, _options: &RenderOptions) -> Result<Vec<String>, RenderError> {
            Ok(self.renders.borrow_mut().pop().unwrap_or_default())
        }
    }

    fn output(sink: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(sink)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn emit_range_withholds_trailing_lines() {
        assert_eq!(emit_range(0, 2, 3), 0..0);
        assert_eq!(emit_range(2, 5, 3), 0..2);
        assert_eq!(emit_range(5, 8, 3), 2..5);
        assert_eq!(emit_range(8, 6, 3), 5..5);
        assert_eq!(emit_range(5, 2, 1), 2..2);
        assert_eq!(emit_range(9, 0, 2), 0..0);
        assert_eq!(flush_range(5, 3), 2..5);
        assert_eq!(flush_range(2, 3), 0..2);
    }

    #[test]
    fn held_three_example_session() {
        let renderer = Scripted::new(&[
            &["l0", "l1"],
            &["l0", "l1", "l2", "l3", "l4"],
            &["l0", "l1", "l2", "l3", "l4"],
        ]);
        let mut sink = Vec::new();
        let mut reconciler =
            StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 3);

        assert_eq!(reconciler.on_fragment("a").expect("fragment"), 0..0);
        assert_eq!(reconciler.on_fragment("b").expect("fragment"), 0..2);
        assert_eq!(reconciler.on_fragment("c").expect("fragment"), 0..0);
        assert_eq!(reconciler.state(), ReconcilerState::Streaming);

        let text = reconciler.on_complete().expect("complete");
        assert_eq!(text, "a\nb\nc");
        assert_eq!(output(&sink), vec!["l0", "l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn render_shrinking_below_the_window_prints_nothing() {
        let renderer = Scripted::new(&[
            &["l0", "l1", "l2", "l3", "l4"],
            &["l0", "l1"],
            &["l0", "l1", "l2", "l3", "l4"],
        ]);
        let mut sink = Vec::new();
        let mut reconciler =
            StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 1);

        assert_eq!(reconciler.on_fragment("a").expect("fragment"), 0..4);
        assert_eq!(reconciler.on_fragment("b").expect("fragment"), 2..2);
        assert_eq!(reconciler.on_fragment("c").expect("fragment"), 4..4);
        assert_eq!(reconciler.emitted(), 4);

        reconciler.on_complete().expect("complete");
        assert_eq!(output(&sink), vec!["l0", "l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn shrinking_render_does_not_reprint_lines() {
        let renderer = Scripted::new(&[
            &["l0", "l1", "l2", "l3", "l4", "l5"],
            &["l0", "l1", "l2", "l3"],
            &["l0", "l1", "l2", "l3", "l4", "l5", "l6"],
        ]);
        let mut sink = Vec::new();
        let mut reconciler =
            StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 2);

        assert_eq!(reconciler.on_fragment("a").expect("fragment"), 0..4);
        assert_eq!(reconciler.on_fragment("b").expect("fragment"), 4..4);
        assert_eq!(reconciler.on_fragment("c").expect("fragment"), 4..5);

        reconciler.on_complete().expect("complete");
        assert_eq!(
            output(&sink),
            vec!["l0", "l1", "l2", "l3", "l4", "l5", "l6"]
        );
    }

    #[test]
    fn completion_after_a_shrink_flushes_only_unprinted_lines() {
        let renderer = Scripted::new(&[&["l0", "l1", "l2", "l3", "l4", "l5"], &["l0", "l1"]]);
        let mut sink = Vec::new();
        let mut reconciler =
            StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 1);

        reconciler.on_fragment("a").expect("fragment");
        reconciler.on_fragment("b").expect("fragment");
        reconciler.on_complete().expect("complete");
        assert_eq!(output(&sink), vec!["l0", "l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn empty_stream_prints_nothing() {
        let renderer = Scripted::new(&[]);
        let mut sink = Vec::new();
        let reconciler = StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 4);
        let text = reconciler.on_complete().expect("complete");
        assert!(text.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn accumulator_keeps_fragment_order() {
        let renderer = Scripted::new(&[&["x"], &["x", "y"]]);
        let mut sink = Vec::new();
        let reconciler = StreamReconciler::new(&renderer, &mut sink, RenderOptions::default(), 4);
        let text = reconciler
            .run(vec![Ok("first".to_string()), Ok("second\r".to_string())])
            .expect("run");
        assert_eq!(text, "first\nsecond");
    }

    #[test]
    fn calls_after_failure_are_rejected() {
        let renderer = Scripted::new(&[]);
        let mut reconciler =
            StreamReconciler::new(&renderer, Vec::new(), RenderOptions::default(), 4);
        reconciler.fail();
        assert!(matches!(
            reconciler.on_fragment("late"),
            Err(StreamError::InvalidState {
                operation: "feed",
                state: ReconcilerState::Failed
            })
        ));
        assert!(matches!(
            reconciler.on_complete(),
            Err(StreamError::InvalidState { .. })
        ));
    }
}
