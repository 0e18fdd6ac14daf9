//! Inclusion stack, preprocessor contexts, and metadata attachment.

use std::sync::Arc;

use xref_core::constants::NON_HEADER_EXTENSIONS;
use xref_core::errors::{ObserverError, ObserverResult};

use super::{CheckedFile, FileState, IndexingObserver, MainSourceFile};
use crate::claim::ClaimClient;
use crate::context::ContextLookup;
use crate::ids::ClaimToken;
use crate::recorder::GraphRecorder;
use crate::source::{FileId, SourceLocation, SourceMap};

/// Tracks which file the walker is in.
pub trait FileTracking {
    /// Enter the file at `location`, included from `blame`.
    ///
    /// Resolution failures are soft: the file is tracked without an entry.
    /// Claim service failures are returned.
    fn push_file(&mut self, blame: SourceLocation, location: SourceLocation) -> ObserverResult<()>;

    /// Leave the innermost file. Leaving the outermost file ends the
    /// compilation unit.
    fn pop_file(&mut self) -> ObserverResult<()>;

    /// Parse `file` as a metadata overlay for every inclusion of `target`.
    /// A header carrying its own metadata passes itself as both. Returns
    /// whether rules were attached.
    fn apply_metadata_file(&mut self, file: FileId, target: FileId) -> bool;

    /// Record that, in `path` under `context`, the inclusion at `offset` is
    /// processed under `dest_context`.
    fn add_context_information(&mut self, path: &str, context: &str, offset: u32, dest_context: &str);

    /// Whether `loc` belongs to the main source file rather than to a file
    /// reached through a header.
    fn is_main_source_file_related_location(&self, loc: SourceLocation) -> bool;

    /// Append an identifier unique to the current main source file.
    fn append_main_source_file_identifier(&self, out: &mut String);

    fn delimit(&mut self);

    fn undelimit(&mut self);
}

fn is_header_name(name: &str) -> bool {
    !NON_HEADER_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> IndexingObserver<R, C, S> {
    /// Context the file pushed from `blame` is processed under.
    fn resolve_context(&mut self, blame: SourceLocation) -> String {
        let Some(parent) = self.file_stack.last() else {
            return self.options.starting_context.clone();
        };
        let Some(parent_uid) = parent.uid.filter(|_| !self.contexts.is_empty()) else {
            return parent.context.clone();
        };
        let lookup = match blame {
            SourceLocation::File { offset, .. } => self.contexts.lookup(parent_uid, &parent.context, offset),
            _ => ContextLookup::MissingOffset,
        };
        match lookup {
            ContextLookup::Found(dest) => dest.to_string(),
            miss => {
                let context = parent.context.clone();
                tracing::warn!(
                    file = %self.source_map.describe_uid(parent_uid),
                    context = %context,
                    offset = blame.offset(),
                    reason = miss.miss_reason().unwrap_or_default(),
                    "keeping parent context"
                );
                self.stats.degraded_context_lookups += 1;
                context
            }
        }
    }
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> FileTracking for IndexingObserver<R, C, S> {
    fn push_file(&mut self, blame: SourceLocation, location: SourceLocation) -> ObserverResult<()> {
        let outermost = self.file_stack.is_empty();
        let previous_uid = self.file_stack.last().and_then(|state| state.uid);
        let mut state = FileState {
            claimed: true,
            ..FileState::default()
        };
        state.context = self.resolve_context(blame);

        let location = if location.is_macro() {
            self.expansion_loc(location)
        } else {
            location
        };
        let file = location.file_id();
        let entry = file
            .and_then(|file| self.source_map.file_entry(file))
            .map(|entry| (entry.uid, entry.name.clone()));

        let mut token = None;
        if let (Some(file), Some((uid, name))) = (file, entry) {
            let in_header =
                previous_uid.is_some_and(|parent| self.transitively_reached_through_header.contains(&parent));
            if in_header || (!outermost && is_header_name(&name)) {
                self.transitively_reached_through_header.insert(uid);
            }
            state.uid = Some(uid);
            state.base_vname = self.vnames.vname_for_path(&name);
            state.vname = state.base_vname.clone();
            state.vname.signature.insert_str(0, &state.context);

            state.claimed = self.claim_client.claim(&self.claimant, &state.vname)?;
            self.stats.claim_requests += 1;
            if !state.claimed {
                self.stats.claims_rejected += 1;
            }
            let file_token = Arc::new(ClaimToken::from_vname(&state.vname, state.claimed));
            self.claim_checked_files.insert(
                file,
                CheckedFile {
                    token: file_token.clone(),
                    signature: state.vname.signature.clone(),
                },
            );
            token = Some(file_token);

            if state.claimed && self.recorded_files.insert(uid) {
                match self.source_map.file_contents(uid) {
                    Some(contents) => {
                        self.recorder
                            .add_file_content(&state.base_vname, contents);
                    }
                    None => {
                        tracing::warn!(file = %name, "couldn't read file content");
                        self.stats.unreadable_files += 1;
                    }
                }
            }
        } else if location.is_valid() {
            tracing::debug!(?location, "file has no entry");
        }

        if outermost {
            self.main_source_file = Some(MainSourceFile {
                loc: location,
                token: token.unwrap_or_else(|| self.default_token.clone()),
            });
        }
        self.file_stack.push(state);
        Ok(())
    }

    fn pop_file(&mut self) -> ObserverResult<()> {
        if self.file_stack.pop().is_none() {
            return Err(ObserverError::InvalidArgument {
                operation: "pop_file",
                message: "no file is active".to_string(),
            });
        }
        if self.file_stack.is_empty() {
            self.deferred_anchors.clear();
            self.range_edges.clear();
            self.stats.log_summary();
        }
        Ok(())
    }

    fn apply_metadata_file(&mut self, file: FileId, target: FileId) -> bool {
        let (Some(entry), Some(target)) = (self.source_map.file_entry(file), self.source_map.file_entry(target)) else {
            tracing::warn!(?file, ?target, "metadata file or its target has no entry");
            return false;
        };
        let target = target.uid;
        let Some(contents) = self.source_map.file_contents(entry.uid) else {
            tracing::warn!(file = %entry.name, "couldn't read metadata file");
            self.stats.unreadable_files += 1;
            return false;
        };
        match self.meta_supports.parse_file(&entry.name, contents, &self.vnames) {
            Some(metadata) => {
                tracing::debug!(file = %entry.name, rules = metadata.len(), "attached metadata");
                self.meta.entry(target).or_default().push(metadata);
                true
            }
            None => false,
        }
    }

    fn add_context_information(&mut self, path: &str, context: &str, offset: u32, dest_context: &str) {
        match self.source_map.uid_for_path(path) {
            Some(uid) => self.contexts.insert(uid, context, offset, dest_context),
            None => tracing::warn!(path, "couldn't find file for context information"),
        }
    }

    fn is_main_source_file_related_location(&self, loc: SourceLocation) -> bool {
        if !self.main_source_file.as_ref().is_some_and(|main| main.loc.is_valid()) {
            return false;
        }
        let Some(file) = self.expansion_loc(loc).file_id() else {
            return true;
        };
        match self.source_map.file_entry(file) {
            Some(entry) => !self.transitively_reached_through_header.contains(&entry.uid),
            None => true,
        }
    }

    fn append_main_source_file_identifier(&self, out: &mut String) {
        if let Some(main) = &self.main_source_file {
            out.push_str(&main.token.stamp_identity(""));
        }
    }

    fn delimit(&mut self) {
        self.recorder.push_entry_group();
    }

    fn undelimit(&mut self) {
        self.recorder.pop_entry_group();
    }
}
