use bstr::BString;

use crate::{error::ResourceError, field::FieldId};

/// Accumulates the fragments of one logical field until it is flushed.
///
/// Fragments are opaque bytes: nothing here looks at UTF-8 or HTTP grammar.
/// A fresh buffer owns no allocation, so fields that never receive data cost
/// nothing.
#[derive(Debug)]
pub(crate) struct FieldBuffer {
    field: FieldId,
    bytes: BString,
    fragments: usize,
    limit: Option<usize>,
}

impl FieldBuffer {
    pub(crate) fn new(field: FieldId, limit: Option<usize>) -> Self {
        Self {
            field,
            bytes: BString::default(),
            fragments: 0,
            limit,
        }
    }

    pub(crate) fn append(&mut self, fragment: &[u8]) -> Result<(), ResourceError> {
        let len = self.bytes.len() + fragment.len();
        if let Some(limit) = self.limit.filter(|limit| len > *limit) {
            return Err(ResourceError::FieldTooLarge {
                field: self.field,
                limit,
            });
        }
        self.bytes
            .try_reserve(fragment.len())
            .map_err(|_| ResourceError::Allocation { field: self.field })?;
        self.bytes.extend_from_slice(fragment);
        self.fragments += 1;
        Ok(())
    }

    /// Concatenation of every fragment since the last flush. Flushing an empty
    /// buffer yields an empty value.
    pub(crate) fn flush(&mut self) -> BString {
        tracing::trace!(field = %self.field, fragments = self.fragments, len = self.bytes.len(), "flush");
        self.fragments = 0;
        core::mem::take(&mut self.bytes)
    }

    /// Drops pending fragments without producing a value.
    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
        self.fragments = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    #[cfg(test)]
    pub(crate) fn fragments(&self) -> usize {
        self.fragments
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}
