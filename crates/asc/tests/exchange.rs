use std::io;

use asc::exchange::{Exchange, ExchangeError};
use asc_stream::{RenderError, RenderOptions, Renderer, StreamError};
use conversation_store::{ConversationStore, StorePaths};
use tempfile::TempDir;

/// Prefixes each line with `> `, failing once the text has `fail_at` lines.
struct Quoting {
    fail_at: Option<usize>,
}

impl Renderer for Quoting {
    fn render(&self, text: &str, _options: &RenderOptions) -> Result<Vec<String>, RenderError> {
        let lines: Vec<String> = text.lines().map(|line| format!("> {line}")).collect();
        if Some(lines.len()) == self.fail_at {
            return Err(RenderError::InvalidUtf8 {
                program: "quoting".to_string(),
            });
        }
        Ok(lines)
    }
}

fn store() -> (TempDir, ConversationStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let paths = StorePaths::new(dir.path().join("data"), dir.path().join("share"));
    (dir, ConversationStore::new(paths))
}

fn source(lines: &[&str]) -> Vec<io::Result<String>> {
    lines.iter().map(|line| Ok(line.to_string())).collect()
}

#[test]
fn successful_exchange_prints_everything_and_saves() {
    let (_dir, store) = store();
    let exchange = Exchange::new(Quoting { fail_at: None }, RenderOptions::default(), 4, &store);
    let mut out = Vec::new();

    let saved = exchange
        .run(source(&["Hello", "", "World", ""]), &mut out, "greet me", "ctx")
        .expect("exchange succeeds");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "> Hello\n> \n> World\n> \n"
    );
    assert_eq!(saved.response, "Hello\n\nWorld");
    assert_eq!(saved.message, "greet me");
    assert_eq!(saved.context, "ctx");
    assert_eq!(store.list().expect("list").len(), 1);
}

#[test]
fn render_failure_is_reported_and_nothing_is_saved() {
    let (_dir, store) = store();
    let exchange = Exchange::new(Quoting { fail_at: Some(6) }, RenderOptions::default(), 2, &store);
    let mut out = Vec::new();

    let err = exchange
        .run(source(&["1", "2", "3", "4", "5", "6", "7"]), &mut out, "m", "")
        .expect_err("sixth render fails");

    assert!(matches!(
        err,
        ExchangeError::Stream(StreamError::Render {
            fragment_index: 5,
            ..
        })
    ));
    assert_eq!(String::from_utf8(out).expect("utf8"), "> 1\n> 2\n> 3\n");
    assert!(store.list().expect("list").is_empty());
}

#[test]
fn source_failure_is_not_saved() {
    let (_dir, store) = store();
    let exchange = Exchange::new(Quoting { fail_at: None }, RenderOptions::default(), 4, &store);
    let lines = vec![Ok("partial".to_string()), Err(io::Error::other("sgpt failed"))];

    let err = exchange
        .run(lines, Vec::new(), "m", "")
        .expect_err("source error surfaces");
    assert!(matches!(
        err,
        ExchangeError::Stream(StreamError::Source {
            fragment_index: 1,
            ..
        })
    ));
    assert!(store.list().expect("list").is_empty());
}

#[cfg(unix)]
#[test]
fn query_process_output_streams_through_the_reconciler() {
    let (_dir, store) = store();
    let exchange = Exchange::new(Quoting { fail_at: None }, RenderOptions::default(), 1, &store);
    let query = asc::source::QueryProcess::spawn_command("printf", ["a\\nb\\n"])
        .expect("printf spawns");
    let mut out = Vec::new();

    let saved = exchange.run(query, &mut out, "q", "").expect("exchange succeeds");
    assert_eq!(saved.response, "a\nb");
    assert_eq!(String::from_utf8(out).expect("utf8"), "> a\n> b\n");
}

#[cfg(unix)]
#[test]
fn failing_exit_after_full_output_drops_the_tail_and_saves_nothing() {
    let (_dir, store) = store();
    let exchange = Exchange::new(Quoting { fail_at: None }, RenderOptions::default(), 4, &store);
    let query = asc::source::QueryProcess::spawn_command("sh", ["-c", "printf 'a\\nb\\n'; exit 5"])
        .expect("sh spawns");
    let mut out = Vec::new();

    let err = exchange
        .run(query, &mut out, "q", "")
        .expect_err("exit status surfaces");
    match err {
        ExchangeError::Stream(StreamError::Source {
            fragment_index,
            source,
        }) => {
            assert_eq!(fragment_index, 2);
            assert!(source.to_string().contains("exit code 5"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.is_empty());
    assert!(store.list().expect("list").is_empty());
}
