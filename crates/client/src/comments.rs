//! Comments pane of the metadata editor
//!
//! Shows the textual annotations of the selected object, newest first as
//! supplied by the [`AnnotationContext`], and tracks what the user wants to
//! add or remove until the editor saves.
//!
//! This is a library-only model: the login front end does not show it. A
//! metadata editor embeds a [`CommentsPane`] and supplies the selection
//! through its own [`AnnotationContext`].

use model::{DataToSave, TextualAnnotation};

/// What the pane needs to know about the current selection
pub trait AnnotationContext {
    /// Textual annotations of the selection, ordered by date
    fn textual_annotations_by_date(&self) -> Vec<TextualAnnotation>;

    /// The user may annotate the selection
    fn can_annotate(&self) -> bool;

    /// Several objects are selected
    fn is_multi_selection(&self) -> bool;

    /// The selected objects belong to different groups
    fn is_across_groups(&self) -> bool;

    /// A new annotation may be linked to the selection
    fn can_add_annotation_link(&self) -> bool;
}

/// Background shading of a comment row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShade {
    Odd,
    Even,
}

/// Comment as displayed in the pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow<'a> {
    pub annotation: &'a TextualAnnotation,
    pub shade: RowShade,
}

#[derive(Debug, Default)]
pub struct CommentsPane {
    draft: String,
    displayed: Vec<TextualAnnotation>,
    to_remove: Vec<TextualAnnotation>,
    editable: bool,
    add_enabled: bool,
    dirty: bool,
}

impl CommentsPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the text being typed
    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
        self.add_enabled = self.has_data_to_save();
        self.dirty = true;
    }

    /// The draft as a new annotation, if it has any content
    pub fn annotations_to_save(&self) -> Vec<TextualAnnotation> {
        if self.has_data_to_save() {
            vec![TextualAnnotation::new(self.draft.clone())]
        } else {
            Vec::new()
        }
    }

    pub fn annotations_to_remove(&self) -> Vec<TextualAnnotation> {
        self.to_remove.clone()
    }

    pub fn has_data_to_save(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Rebuild the pane for a new selection
    ///
    /// Nothing is listed while several objects are selected.
    pub fn build(&mut self, ctx: &dyn AnnotationContext) {
        if ctx.is_multi_selection() {
            self.display(Vec::new(), ctx);
        } else {
            self.display(ctx.textual_annotations_by_date(), ctx);
        }
    }

    /// Redisplay the annotations of the current selection
    pub fn refresh(&mut self, ctx: &dyn AnnotationContext) {
        self.display(ctx.textual_annotations_by_date(), ctx);
    }

    fn display(&mut self, annotations: Vec<TextualAnnotation>, ctx: &dyn AnnotationContext) {
        let mut editable = ctx.can_annotate();
        if editable && ctx.is_multi_selection() {
            editable = !ctx.is_across_groups();
        }
        self.editable = editable;
        self.displayed = annotations;
    }

    /// Mark `annotation` for removal
    ///
    /// It replaces any earlier pending removal and disappears from the list.
    pub fn remove_textual_annotation(
        &mut self,
        annotation: TextualAnnotation,
        ctx: &dyn AnnotationContext,
    ) {
        let keep = ctx
            .textual_annotations_by_date()
            .into_iter()
            .filter(|a| !a.same_id(&annotation))
            .collect();
        self.to_remove = vec![annotation];
        self.display(keep, ctx);
        self.dirty = true;
    }

    /// Forget pending changes before another object is shown
    pub fn clear_data(&mut self) {
        self.to_remove.clear();
        self.displayed.clear();
        self.draft.clear();
        self.add_enabled = false;
        self.dirty = false;
    }

    /// Batch sent when the user presses "Add comment"
    pub fn save_comment(&self) -> DataToSave {
        DataToSave::new(self.annotations_to_save(), Vec::new())
    }

    pub fn on_related_nodes_set(&mut self, ctx: &dyn AnnotationContext) {
        self.add_enabled = ctx.can_add_annotation_link();
    }

    pub fn displayed(&self) -> &[TextualAnnotation] {
        &self.displayed
    }

    /// Displayed comments with alternating shading, starting odd
    pub fn rows(&self) -> impl Iterator<Item = CommentRow<'_>> {
        self.displayed.iter().enumerate().map(|(i, annotation)| CommentRow {
            annotation,
            shade: if i % 2 == 0 { RowShade::Odd } else { RowShade::Even },
        })
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_add_enabled(&self) -> bool {
        self.add_enabled
    }

    /// The pane has changes the editor should offer to save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
