// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module defines the progress-reporting seam of the engines. The core
//! algorithms push events into a `SearchObserver` as they run; they never
//! format strings and never touch any I/O. Whether and how events are
//! persisted or printed is entirely up to the surrounding driver.

use std::time::Duration;

use crate::Agent;

/// One progress event emitted by a running engine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new incumbent solution was found.
    Incumbent {
        /// The cost of the incumbent.
        cost: i64,
        /// The item-to-agent mapping of the incumbent.
        assignment: Vec<Option<Agent>>,
        /// A short textual tag identifying the reporting engine.
        tag: &'static str,
        /// Time elapsed since the engine started.
        elapsed: Duration,
    },
    /// A new proven lower bound was derived.
    Bound {
        bound: i64,
        tag: &'static str,
        elapsed: Duration,
    },
}

/// The observer the engines report their progress to.
pub trait SearchObserver: Send + Sync {
    fn notify(&self, event: Event);
}

/// The default observer: it swallows every event.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopObserver;
impl SearchObserver for NoopObserver {
    fn notify(&self, _event: Event) {}
}
