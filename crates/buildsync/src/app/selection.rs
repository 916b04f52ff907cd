//! Turning selection events into ordered candidate lists.

use std::fmt;

use crate::app::adapt::Adaptable;
use crate::domain::model::ResourceRef;

/// What the active editor is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    /// An editor backed by a workspace file.
    File(ResourceRef),
    /// Anything without a backing file: scratch buffers, diff views, remote documents.
    Buffer { name: String },
}

impl EditorInput {
    pub fn backing_file(&self) -> Option<&ResourceRef> {
        match self {
            EditorInput::File(resource) => Some(resource),
            EditorInput::Buffer { .. } => None,
        }
    }
}

impl Adaptable for EditorInput {
    fn as_resource(&self) -> Option<ResourceRef> {
        self.backing_file().cloned()
    }
}

/// Context captured when the synchronize command fires.
///
/// Carries an optional structured selection (ordered, arbitrary objects) and an optional
/// active editor input. Built once per invocation and never mutated afterwards.
#[derive(Default)]
pub struct SelectionEvent<'a> {
    selection: Option<Vec<Box<dyn Adaptable + 'a>>>,
    editor: Option<EditorInput>,
}

impl<'a> SelectionEvent<'a> {
    /// An event with neither a selection nor an editor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An event carrying a structured selection in the given order.
    pub fn structured<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Adaptable + 'a>>,
    {
        Self {
            selection: Some(items.into_iter().collect()),
            editor: None,
        }
    }

    /// An event where only an editor is active.
    pub fn editor(input: EditorInput) -> Self {
        Self {
            selection: None,
            editor: Some(input),
        }
    }

    /// Attach the active editor to an existing event.
    pub fn with_editor(mut self, input: EditorInput) -> Self {
        self.editor = Some(input);
        self
    }

    pub fn as_structured_selection(&self) -> Option<&[Box<dyn Adaptable + 'a>]> {
        self.selection.as_deref()
    }

    pub fn active_editor(&self) -> Option<&EditorInput> {
        self.editor.as_ref()
    }

    pub fn active_editor_backing_file(&self) -> Option<&ResourceRef> {
        self.editor.as_ref().and_then(EditorInput::backing_file)
    }
}

impl fmt::Debug for SelectionEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionEvent")
            .field("selection_len", &self.selection.as_ref().map(Vec::len))
            .field("editor", &self.editor)
            .finish()
    }
}

/// Collect the candidates an event refers to.
///
/// A structured selection always wins, even when it is empty. Without one, a file-backed
/// editor contributes its file. Anything else yields no candidates.
pub fn resolve_candidates<'e>(event: &'e SelectionEvent<'_>) -> Vec<&'e dyn Adaptable> {
    if let Some(items) = event.as_structured_selection() {
        return items
            .iter()
            .map(|item| &**item as &dyn Adaptable)
            .collect();
    }

    match event.active_editor_backing_file() {
        Some(file) => vec![file as &dyn Adaptable],
        None => Vec::new(),
    }
}
