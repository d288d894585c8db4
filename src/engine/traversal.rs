// src/engine/traversal.rs
// =============================================================================
// Depth-first traversal over a ViewProvider / Navigator pair.
//
// Per level:
// 1. Take a snapshot of the active context and read its rows
// 2. Emit each directory, wait the politeness delay, enter it, recurse,
//    and come back out
// 3. Emit each file and, when a classifier is set, record matches
//
// Recovery, all local to the level or child being processed:
// - a stale row during reading triggers a fresh snapshot (bounded)
// - an enter that times out or is intercepted skips that child; when the
//   view already left the parent it is brought back first
// - a failed exit is logged and the level carries on with its snapshot
// - a level that cannot be read at all is counted as an error
//
// Max depth is checked before navigating, so no transition is spent on a
// level whose children would never be read.
// =============================================================================

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use super::VisitedSet;
use crate::config::CrawlConfig;
use crate::decode;
use crate::error::ViewError;
use crate::matcher::Classifier;
use crate::model::{MatchRecord, Node, Report, Statistics, TraversalContext};
use crate::sink::EventSink;
use crate::view::{Navigator, Row, Transition, ViewProvider};

const DIRECTORY_PROGRESS_EVERY: usize = 10;
const FILE_PROGRESS_EVERY: usize = 100;

pub struct TraversalEngine<P, N> {
    provider: P,
    navigator: N,
    config: CrawlConfig,
    sink: Box<dyn EventSink>,
    classifier: Option<Box<dyn Classifier>>,
    visited: VisitedSet,
    levels_entered: usize,
    stats: Statistics,
    matches: Vec<MatchRecord>,
}

impl<P: ViewProvider, N: Navigator> TraversalEngine<P, N> {
    pub fn new(provider: P, navigator: N, config: CrawlConfig, sink: Box<dyn EventSink>) -> Self {
        Self {
            provider,
            navigator,
            config,
            sink,
            classifier: None,
            visited: VisitedSet::new(),
            levels_entered: 0,
            stats: Statistics::default(),
            matches: Vec::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: Option<Box<dyn Classifier>>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Walks everything reachable from `root` until done or until `interrupt`
    /// resolves. Whatever was discovered before an interruption is kept.
    pub async fn run<F>(&mut self, root: TraversalContext, interrupt: F) -> Report
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();

        let interrupted = tokio::select! {
            _ = self.visit(root) => false,
            _ = interrupt => {
                warn!("Interrupted; keeping results gathered so far");
                true
            }
        };

        self.report(start.elapsed(), interrupted)
    }

    /// Walks everything reachable from `root` with no way to stop early.
    pub async fn traverse(&mut self, root: TraversalContext) -> Report {
        self.run(root, std::future::pending()).await
    }

    fn report(&self, elapsed: Duration, interrupted: bool) -> Report {
        Report {
            stats: self.stats.clone(),
            visited: self.levels_entered,
            duration_secs: elapsed.as_secs_f64(),
            interrupted,
            matches: self.matches.clone(),
        }
    }

    // Boxed because the future recurses through process_directory
    fn visit(&mut self, ctx: TraversalContext) -> BoxFuture<'_, ()> {
        async move {
            if ctx.depth >= self.config.max_depth {
                info!("Max depth {} reached at {}", self.config.max_depth, ctx.describe());
                return;
            }

            if let Some(location) = &ctx.location {
                if !self.visited.insert(location) {
                    debug!("Already visited: {}", location);
                    return;
                }
            }

            self.levels_entered += 1;
            info!("Crawling: {} (depth: {})", ctx.describe(), ctx.depth);

            let nodes = match self.read_level(&ctx).await {
                Ok(Some(nodes)) => nodes,
                Ok(None) => {
                    info!("No entries at {}", ctx.describe());
                    return;
                }
                Err(e) => {
                    error!("Failed to read {}: {}", ctx.describe(), e);
                    self.stats.errors += 1;
                    return;
                }
            };

            let (directories, files): (Vec<Node>, Vec<Node>) =
                nodes.into_iter().partition(Node::is_dir);

            for directory in &directories {
                self.process_directory(&ctx, directory).await;
            }

            for file in files {
                self.process_file(file);
            }
        }
        .boxed()
    }

    /// Reads every row of the active context.
    ///
    /// Returns `Ok(None)` when the view has fewer rows than a populated
    /// level needs.
    async fn read_level(&mut self, ctx: &TraversalContext) -> Result<Option<Vec<Node>>, ViewError> {
        let mut count = self.provider.snapshot(ctx).await?;
        if count < self.provider.min_rows() {
            return Ok(None);
        }

        let mut nodes = Vec::with_capacity(count);
        let mut index = 0;
        let mut refreshes = 0;

        while index < count {
            match self.provider.read_row(ctx, index).await {
                Ok(Row::Node(node)) => {
                    nodes.push(node);
                    index += 1;
                }
                Ok(Row::Placeholder) => index += 1,
                Ok(Row::Degenerate { columns }) => {
                    warn!(
                        "Skipping row {} at {}: only {} column(s)",
                        index,
                        ctx.describe(),
                        columns
                    );
                    self.stats.warnings += 1;
                    index += 1;
                }
                Ok(Row::Unclassified { name }) => {
                    warn!("Unknown entry type for '{}' at {}", name, ctx.describe());
                    self.stats.warnings += 1;
                    index += 1;
                }
                Err(e) if e.is_stale() => {
                    if refreshes >= self.config.stale_retries {
                        warn!(
                            "Rows at {} kept going stale; stopping after {} of {}",
                            ctx.describe(),
                            index,
                            count
                        );
                        self.stats.warnings += 1;
                        break;
                    }
                    refreshes += 1;
                    debug!("Row {} at {} went stale; re-reading the view", index, ctx.describe());

                    count = self.provider.snapshot(ctx).await?;
                    if index >= count {
                        debug!("View at {} shrank to {} row(s)", ctx.describe(), count);
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(nodes))
    }

    async fn process_directory(&mut self, parent: &TraversalContext, directory: &Node) {
        self.emit(directory);
        self.stats.directories += 1;
        if self.stats.directories % DIRECTORY_PROGRESS_EVERY == 0 {
            info!("Found {} directories so far", self.stats.directories);
        }

        if directory.path_len() >= self.config.max_depth {
            debug!(
                "Not entering {}: max depth {} reached",
                directory.full_path(),
                self.config.max_depth
            );
            return;
        }

        let child = parent.child(directory);

        if let Some(location) = &child.location {
            if self.visited.contains(location) {
                debug!("Already visited: {}", location);
                return;
            }
        }

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        match self.navigator.enter(parent, directory).await {
            Ok(Transition::Stabilized) => {}
            Ok(Transition::Timeout {
                attempts,
                left_parent,
            }) => {
                warn!(
                    "Could not open {} after {} attempt(s); skipping it",
                    directory.full_path(),
                    attempts
                );
                self.stats.warnings += 1;
                self.stats.errors += 1;
                // The old rows are gone, so the view is no longer the parent's
                if left_parent {
                    self.return_from(&child, directory).await;
                }
                return;
            }
            Ok(Transition::Intercepted) => {
                warn!("Click on {} was intercepted; skipping it", directory.full_path());
                self.stats.warnings += 1;
                self.stats.errors += 1;
                return;
            }
            Ok(Transition::Stale) => {
                warn!("{} is no longer in the view; skipping it", directory.full_path());
                self.stats.warnings += 1;
                return;
            }
            Err(e) => {
                error!("Failed to open {}: {}", directory.full_path(), e);
                self.stats.errors += 1;
                return;
            }
        }

        self.visit(child.clone()).await;
        self.return_from(&child, directory).await;
    }

    // The level carries on with the snapshot it took before descending;
    // enter() re-locates rows by reference, so a partial return is safe
    async fn return_from(&mut self, child: &TraversalContext, directory: &Node) {
        if !self.navigator.is_stateful() {
            return;
        }

        match self.navigator.exit(child).await {
            Ok(Transition::Stabilized) => {}
            Ok(outcome) => {
                warn!(
                    "Returning from {} did not settle ({:?}); continuing",
                    directory.full_path(),
                    outcome
                );
                self.stats.warnings += 1;
            }
            Err(e) => {
                warn!("Failed to return from {}: {}; continuing", directory.full_path(), e);
                self.stats.warnings += 1;
            }
        }
    }

    fn process_file(&mut self, file: Node) {
        let (file, matched) = match &self.classifier {
            Some(classifier) => {
                let name = decode::search_name(&file);
                let tag = classifier.classify(&name);
                let matched = tag.clone().map(|keyword| MatchRecord {
                    keyword,
                    directory: file.directory(),
                    file_name: name,
                });
                (file.with_match_tag(tag), matched)
            }
            None => (file, None),
        };

        self.emit(&file);
        self.stats.files += 1;
        if self.stats.files % FILE_PROGRESS_EVERY == 0 {
            info!("Found {} files so far", self.stats.files);
        }

        if let Some(record) = matched {
            info!(
                "Match '{}': {}/{}",
                record.keyword, record.directory, record.file_name
            );
            self.matches.push(record);
            self.stats.matches += 1;
        }
    }

    fn emit(&mut self, node: &Node) {
        if let Err(e) = self.sink.record(node) {
            error!("Failed to record {}: {}", node.full_path(), e);
            self.stats.errors += 1;
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why BoxFuture for visit()?
//    - An async fn that calls itself would have an infinitely sized future
//    - Boxing gives the recursive call a fixed size (one pointer)
//    - .boxed() also requires the future to be Send, which the traits
//      guarantee through their `Send` supertraits
//
// 2. Why partition() into directories and files?
//    - Directories are processed first so their subtrees are walked
//      before sibling files are emitted
//    - partition keeps the snapshot order inside each group
//
// 3. What does tokio::select! do in run()?
//    - Polls both futures and finishes with whichever completes first
//    - The losing future is dropped, which stops the traversal where it is
//    - self.stats and self.matches survive because they live on the engine
// -----------------------------------------------------------------------------
