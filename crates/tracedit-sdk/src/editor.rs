use std::io::Write;
use std::path::{Path, PathBuf};

use tracedit_engine::{edit_snapshot, Propagation, ResolutionEngine, Replayer};
use tracedit_state::StateSnapshot;
use tracedit_store::{BlobStore, InMemoryBlobStore, LooseFileBlobStore, StoreMode};
use tracedit_session::{
    data_dir, data_folder_name, load, paths, save, LoadReport, SaveSummary, SessionContext,
    SessionFile,
};
use tracedit_trace::{read_keyframe_snapshot, TraceMetadata, TraceReader, TraceResult};
use tracedit_tree::{CallTree, Direction, NodeId};
use tracing::{info, warn};

use crate::config::EditorConfig;
use crate::error::{SdkError, SdkResult};

/// A trace opened in the editor, with its call tree.
#[derive(Debug)]
pub struct OpenTrace {
    metadata: TraceMetadata,
    tree: CallTree,
    has_keyframe: bool,
}

impl OpenTrace {
    pub fn metadata(&self) -> &TraceMetadata {
        &self.metadata
    }

    pub fn tree(&self) -> &CallTree {
        &self.tree
    }

    /// Whether the trace is trimmed and its keyframe was attached to frame 0.
    pub fn has_keyframe(&self) -> bool {
        self.has_keyframe
    }
}

/// High-level editor API.
///
/// Holds at most one open trace, the current selection in its call tree,
/// and the resolution engine that computes snapshots for it.
pub struct Editor<R: Replayer> {
    config: EditorConfig,
    engine: ResolutionEngine<R>,
    trace: Option<OpenTrace>,
    current: Option<NodeId>,
}

impl<R: Replayer> Editor<R> {
    pub fn new(replayer: R) -> Self {
        Self::with_config(replayer, EditorConfig::default())
    }

    pub fn with_config(replayer: R, config: EditorConfig) -> Self {
        Self {
            config,
            engine: ResolutionEngine::new(replayer),
            trace: None,
            current: None,
        }
    }

    // ---- Trace ----

    /// Index the trace read by `reader` and make it the open trace.
    ///
    /// If the trace carries a keyframe snapshot it is attached to frame 0. A
    /// keyframe that cannot be read is logged and the trace opens without it.
    /// If indexing fails the previously open trace stays open.
    pub fn open_trace(
        &mut self,
        path: impl AsRef<Path>,
        reader: &mut dyn TraceReader,
    ) -> SdkResult<&OpenTrace> {
        let path = paths::absolute(path.as_ref());
        let mut tree = CallTree::build(reader)?;

        let keyframe = match read_keyframe_snapshot(reader) {
            Ok(keyframe) => keyframe,
            Err(error) => {
                warn!(trace = %path.display(), %error, "ignoring unreadable keyframe snapshot");
                None
            }
        };
        let mut has_keyframe = false;
        if let Some(snapshot) = keyframe {
            if let Some(frame) = tree.find_by_frame_number(0) {
                tree.ensure_container(frame)?.attach(Some(snapshot));
                has_keyframe = true;
            }
        }

        let metadata = TraceMetadata::new(path, reader.sof_packet());
        info!(
            trace = %metadata.path.display(),
            calls = tree.call_count(),
            frames = tree.frame_count(),
            has_keyframe,
            "opened trace"
        );
        self.current = None;
        Ok(self.trace.insert(OpenTrace {
            metadata,
            tree,
            has_keyframe,
        }))
    }

    /// Close the open trace, returning it.
    pub fn close_trace(&mut self) -> Option<OpenTrace> {
        self.current = None;
        let closed = self.trace.take();
        if let Some(trace) = &closed {
            info!(trace = %trace.metadata.path.display(), "closed trace");
        }
        closed
    }

    pub fn trace(&self) -> Option<&OpenTrace> {
        self.trace.as_ref()
    }

    pub fn tree(&self) -> SdkResult<&CallTree> {
        Ok(&self.open()?.tree)
    }

    fn open(&self) -> SdkResult<&OpenTrace> {
        self.trace.as_ref().ok_or(SdkError::NoTraceOpen)
    }

    // ---- Selection and navigation ----

    pub fn select(&mut self, node: NodeId) -> SdkResult<()> {
        self.open()?.tree.check(node)?;
        self.current = Some(node);
        Ok(())
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn next_snapshot(&mut self) -> SdkResult<Option<NodeId>> {
        let found = self.open()?.tree.find_next_with_snapshot(self.current)?;
        Ok(self.move_to(found))
    }

    pub fn prev_snapshot(&mut self) -> SdkResult<Option<NodeId>> {
        let found = self.open()?.tree.find_prev_with_snapshot(self.current)?;
        Ok(self.move_to(found))
    }

    pub fn next_drawcall(&mut self) -> SdkResult<Option<NodeId>> {
        let found = self.open()?.tree.find_next_drawcall(self.current)?;
        Ok(self.move_to(found))
    }

    pub fn prev_drawcall(&mut self) -> SdkResult<Option<NodeId>> {
        let found = self.open()?.tree.find_prev_drawcall(self.current)?;
        Ok(self.move_to(found))
    }

    /// Search forward from the selection using the configured options.
    pub fn search_next(&mut self, needle: &str) -> SdkResult<Option<NodeId>> {
        self.search(needle, Direction::Forward)
    }

    pub fn search_prev(&mut self, needle: &str) -> SdkResult<Option<NodeId>> {
        self.search(needle, Direction::Backward)
    }

    fn search(&mut self, needle: &str, direction: Direction) -> SdkResult<Option<NodeId>> {
        let found = self
            .open()?
            .tree
            .search(self.current, needle, direction, &self.config.search)?;
        Ok(self.move_to(found))
    }

    fn move_to(&mut self, found: Option<NodeId>) -> Option<NodeId> {
        if found.is_some() {
            self.current = found;
        }
        found
    }

    // ---- Snapshots ----

    /// The state right after `node`, computed if needed.
    pub fn resolve(&mut self, node: NodeId) -> SdkResult<&StateSnapshot> {
        let trace = self.trace.as_mut().ok_or(SdkError::NoTraceOpen)?;
        Ok(self.engine.resolve(&mut trace.tree, node)?)
    }

    pub fn resolve_current(&mut self) -> SdkResult<&StateSnapshot> {
        let node = self.current.ok_or(SdkError::NoSelection)?;
        self.resolve(node)
    }

    /// Edit the snapshot at `node` and mark later snapshots outdated.
    pub fn edit<F>(&mut self, node: NodeId, f: F) -> SdkResult<Propagation>
    where
        F: FnOnce(&mut StateSnapshot),
    {
        let trace = self.trace.as_mut().ok_or(SdkError::NoTraceOpen)?;
        Ok(edit_snapshot(&mut trace.tree, node, f)?)
    }

    pub fn engine(&self) -> &ResolutionEngine<R> {
        &self.engine
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ---- Sessions ----

    /// Save the open trace's snapshots as a session at `path`.
    pub fn save_session(&self, path: &Path) -> SdkResult<SaveSummary> {
        let trace = self.open()?;
        let folder = data_folder_name(path, &self.config.session.data_folder_suffix);
        let blobs = LooseFileBlobStore::open(data_dir(path, &folder), StoreMode::ReadWrite)?;
        let ctx = SessionContext::new(path, &trace.metadata, &blobs).with_data_folder(folder);
        Ok(save(&ctx, &trace.tree)?)
    }

    /// Load the session at `path`.
    ///
    /// When the session's base trace is not the open trace, `opener` is
    /// asked for a reader on it and the trace is opened first.
    pub fn load_session<F>(&mut self, path: &Path, opener: F) -> SdkResult<LoadReport>
    where
        F: FnOnce(&Path) -> TraceResult<Box<dyn TraceReader>>,
    {
        let file = SessionFile::read(path)?;
        let base = file.base_trace_path();
        let is_open = self
            .trace
            .as_ref()
            .is_some_and(|t| paths::absolute(&t.metadata.path) == base);
        if !is_open {
            let mut reader = opener(&base)?;
            self.open_trace(&base, reader.as_mut())?;
        }

        let dir = file.data_dir();
        let blobs: Box<dyn BlobStore> = if dir.is_dir() {
            Box::new(LooseFileBlobStore::open(&dir, StoreMode::ReadOnly)?)
        } else {
            warn!(dir = %dir.display(), "session-data folder is missing");
            Box::new(InMemoryBlobStore::new())
        };

        let trace = self.trace.as_mut().ok_or(SdkError::NoTraceOpen)?;
        Ok(load(&file, &trace.metadata, blobs.as_ref(), &mut trace.tree)?)
    }

    /// Default session file for the open trace: `<trace stem>-tracedit.json`
    /// next to the trace.
    pub fn suggested_session_path(&self) -> SdkResult<PathBuf> {
        let path = &self.open()?.metadata.path;
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        Ok(path.with_file_name(format!("{stem}-tracedit.json")))
    }

    // ---- Export ----

    /// Write the text of every frame and call, one per line, in execution
    /// order. Returns the number of lines written.
    pub fn export_api_calls<W: Write>(&self, out: &mut W) -> SdkResult<usize> {
        let tree = &self.open()?.tree;
        let mut lines = 0;
        for (_, node) in tree.iter() {
            writeln!(out, "{}", node.text())?;
            lines += 1;
        }
        out.flush()?;
        Ok(lines)
    }

    /// Default export file: the trace stem up to its last `-`, followed by
    /// `-ApiCalls.txt`.
    pub fn suggested_export_path(&self) -> SdkResult<PathBuf> {
        let path = &self.open()?.metadata.path;
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        let base = stem.rsplit_once('-').map_or(&*stem, |(head, _)| head);
        Ok(path.with_file_name(format!("{base}-ApiCalls.txt")))
    }
}
