// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bounded Task Runner
//!
//! Pull-based worker pool over an ordered list of deferred tasks. At most
//! `min(concurrency, tasks)` tasks are in flight; each worker claims the
//! next unclaimed index, runs that task, and files the result under the same
//! index, so output order equals input order regardless of completion order.
//!
//! Workers are polled cooperatively inside the caller's task, so a slow task
//! only occupies its own worker.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements bounded, order-preserving batch execution

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;

/// Run every task with at most `concurrency` in flight; results keep input order.
///
/// `concurrency` is clamped to at least 1. Rust futures are lazy, so a task
/// does nothing until a worker claims and polls it.
pub async fn run_bounded<F, T>(tasks: Vec<F>, concurrency: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let worker_count = concurrency.max(1).min(total);
    // The enumerated iterator is the shared cursor; `next()` under the lock claims one index.
    let cursor = Mutex::new(tasks.into_iter().enumerate());
    let cursor = &cursor;

    let workers = (0..worker_count).map(move |_| async move {
        let mut finished = Vec::new();
        loop {
            let claimed = cursor.lock().next();
            let Some((index, task)) = claimed else {
                break;
            };
            finished.push((index, task.await));
        }
        finished
    });

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    for (index, result) in join_all(workers).await.into_iter().flatten() {
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}
