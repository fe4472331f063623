//! All-or-nothing attribute edit sessions.

use super::{AttributeValue, FeatureId, Field, Layer, LayerError};

/// Buffered attribute edits on a layer.
///
/// Edits are validated when recorded but only written by [`commit`]. Calling
/// [`rollback`], or dropping the session without committing, discards every
/// pending edit and removes the fields the session added, so a layer never
/// shows a partial set of edits. The session borrows the layer mutably, which
/// rules out a second concurrent session on the same layer.
///
/// [`commit`]: EditSession::commit
/// [`rollback`]: EditSession::rollback
#[derive(Debug)]
pub struct EditSession<'a> {
    layer: &'a mut Layer,
    pending: Vec<(FeatureId, usize, AttributeValue)>,
    added_fields: Vec<String>,
    finished: bool,
}

impl<'a> EditSession<'a> {
    pub(super) fn new(layer: &'a mut Layer) -> Self {
        Self {
            layer,
            pending: Vec::new(),
            added_fields: Vec::new(),
            finished: false,
        }
    }

    /// The layer being edited, with pending edits not yet applied.
    pub fn layer(&self) -> &Layer {
        &*self.layer
    }

    /// Index of `field`, adding it to the schema if absent.
    ///
    /// A field added here is removed again on rollback.
    pub fn add_field(&mut self, field: Field) -> Result<usize, LayerError> {
        if self.layer.schema().index_of(field.name()).is_some() {
            return self.layer.ensure_field(field);
        }
        let name = field.name().to_string();
        let index = self.layer.add_field(field)?;
        self.added_fields.push(name);
        Ok(index)
    }

    /// Record an edit.
    pub fn set(
        &mut self,
        id: FeatureId,
        field: usize,
        value: AttributeValue,
    ) -> Result<(), LayerError> {
        if !self.layer.contains(id) {
            return Err(LayerError::UnknownFeature(id));
        }
        let value = self.layer.check_value(field, value)?;
        self.pending.push((id, field, value));
        Ok(())
    }

    /// Number of recorded edits.
    pub fn pending_edits(&self) -> usize {
        self.pending.len()
    }

    /// Apply every recorded edit. Returns how many were written.
    pub fn commit(mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (id, field, value) in pending {
            self.layer.write_unchecked(id, field, value);
        }
        self.added_fields.clear();
        self.finished = true;
        count
    }

    /// Discard every recorded edit and any field added by this session.
    pub fn rollback(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        self.pending.clear();
        for name in self.added_fields.drain(..).rev() {
            self.layer.remove_field(&name);
        }
        self.finished = true;
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.discard();
        }
    }
}
