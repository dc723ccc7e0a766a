//! Custom test assertions for filesystem trees and task events

use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use ez_unzip::{Event, TaskId};
use walkdir::WalkDir;

/// Every path below `root`, relative and sorted, directories with a trailing `/`
pub fn tree(root: &Path) -> Vec<String> {
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if e.file_type().is_dir() {
                format!("{rel}/")
            } else {
                rel
            }
        })
        .collect();
    entries.sort();
    entries
}

/// Assert that no file with a decodable archive extension is left below `root`
pub fn assert_no_archives(root: &Path) {
    for entry in WalkDir::new(root) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            assert!(
                !ez_unzip::extraction::is_archive(entry.path()),
                "leftover archive: {}",
                entry.path().display()
            );
        }
    }
}

/// Collect the events of task `id` until its `Done` or `Failed` event
///
/// # Returns
/// The collected events, including the terminal one. Panics on timeout.
pub async fn collect_task_events(
    events: &mut broadcast::Receiver<Event>,
    id: TaskId,
    timeout: Duration,
) -> Vec<Event> {
    let collected = tokio::time::timeout(timeout, async {
        let mut collected = Vec::new();
        loop {
            match events.recv().await {
                Ok(event) if event_id(&event) == id => {
                    let terminal = matches!(event, Event::Done { .. } | Event::Failed { .. });
                    collected.push(event);
                    if terminal {
                        return collected;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    panic!("event receiver lagged by {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event channel closed before task {id} finished");
                }
            }
        }
    })
    .await;

    collected.unwrap_or_else(|_| panic!("timed out waiting for task {id}"))
}

/// Task ID carried by an event
pub fn event_id(event: &Event) -> TaskId {
    match event {
        Event::Queued { id, .. }
        | Event::Extracting { id, .. }
        | Event::Cleaning { id, .. }
        | Event::Unwinding { id, .. }
        | Event::Compressing { id, .. }
        | Event::Done { id, .. }
        | Event::Failed { id, .. } => *id,
    }
}
