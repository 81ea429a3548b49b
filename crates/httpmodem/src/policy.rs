//! Decides what must be flushed before a new fragment or signal is processed.
//!
//! The policy is a pure function of the accumulation state and the incoming
//! field. It never touches buffers; the session applies its decisions in the
//! order returned so that emission order matches arrival order.

use crate::field::{FieldGroup, FieldId};

/// What is currently accumulating. At most one group is pending at a time:
/// any cross-group transition flushes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Pending {
    #[default]
    Idle,
    /// A url-group member. Holds `Url`, `Path`, `QueryString` or `Fragment`.
    Url(FieldId),
    /// A header name, not yet followed by its value.
    HeaderField,
    /// A header value; its name sits in the header-field buffer.
    HeaderValue,
}

/// Buffers to finalize into one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flush {
    Nothing,
    Url(FieldId),
    HeaderPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) flush: Flush,
    pub(crate) next: Pending,
}

impl Pending {
    fn flush(self) -> Flush {
        match self {
            Pending::Idle => Flush::Nothing,
            Pending::Url(field) => Flush::Url(field),
            Pending::HeaderField | Pending::HeaderValue => Flush::HeaderPair,
        }
    }
}

/// A data fragment for `field` arrived.
///
/// Body fragments are never buffered, so for them `next` is always
/// [`Pending::Idle`] and the caller emits the fragment directly.
pub(crate) fn on_data(pending: Pending, field: FieldId) -> Decision {
    match (field.group(), pending) {
        (FieldGroup::Url, Pending::Url(current)) if current == field => Decision {
            flush: Flush::Nothing,
            next: pending,
        },
        (FieldGroup::Url, _) => Decision {
            flush: pending.flush(),
            next: Pending::Url(field),
        },
        (FieldGroup::HeaderPair, Pending::HeaderField) => Decision {
            flush: Flush::Nothing,
            next: if field == FieldId::HeaderValue {
                Pending::HeaderValue
            } else {
                Pending::HeaderField
            },
        },
        (FieldGroup::HeaderPair, Pending::HeaderValue) => Decision {
            // A new name after a value starts the next header.
            flush: if field == FieldId::HeaderField {
                Flush::HeaderPair
            } else {
                Flush::Nothing
            },
            next: if field == FieldId::HeaderField {
                Pending::HeaderField
            } else {
                Pending::HeaderValue
            },
        },
        (FieldGroup::HeaderPair, _) => Decision {
            flush: pending.flush(),
            next: if field == FieldId::HeaderValue {
                Pending::HeaderValue
            } else {
                Pending::HeaderField
            },
        },
        (FieldGroup::Body | FieldGroup::Signal, _) => on_boundary(pending),
    }
}

/// A boundary signal fired, or body data arrived: everything pending goes
/// first.
pub(crate) fn on_boundary(pending: Pending) -> Decision {
    Decision {
        flush: pending.flush(),
        next: Pending::Idle,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::url_continues(Pending::Url(FieldId::Url), FieldId::Url, Flush::Nothing, Pending::Url(FieldId::Url))]
    #[case::path_to_query(
        Pending::Url(FieldId::Path),
        FieldId::QueryString,
        Flush::Url(FieldId::Path),
        Pending::Url(FieldId::QueryString)
    )]
    #[case::url_to_header(
        Pending::Url(FieldId::Url),
        FieldId::HeaderField,
        Flush::Url(FieldId::Url),
        Pending::HeaderField
    )]
    #[case::field_continues(Pending::HeaderField, FieldId::HeaderField, Flush::Nothing, Pending::HeaderField)]
    #[case::field_to_value(Pending::HeaderField, FieldId::HeaderValue, Flush::Nothing, Pending::HeaderValue)]
    #[case::value_continues(Pending::HeaderValue, FieldId::HeaderValue, Flush::Nothing, Pending::HeaderValue)]
    #[case::value_to_field(Pending::HeaderValue, FieldId::HeaderField, Flush::HeaderPair, Pending::HeaderField)]
    #[case::value_without_field(Pending::Idle, FieldId::HeaderValue, Flush::Nothing, Pending::HeaderValue)]
    #[case::body_after_value(Pending::HeaderValue, FieldId::Body, Flush::HeaderPair, Pending::Idle)]
    #[case::body_after_url(Pending::Url(FieldId::Fragment), FieldId::Body, Flush::Url(FieldId::Fragment), Pending::Idle)]
    #[case::idle_body(Pending::Idle, FieldId::Body, Flush::Nothing, Pending::Idle)]
    fn data_transitions(
        #[case] pending: Pending,
        #[case] field: FieldId,
        #[case] flush: Flush,
        #[case] next: Pending,
    ) {
        assert_eq!(on_data(pending, field), Decision { flush, next });
    }

    #[rstest]
    #[case(Pending::Idle, Flush::Nothing)]
    #[case(Pending::Url(FieldId::QueryString), Flush::Url(FieldId::QueryString))]
    #[case(Pending::HeaderField, Flush::HeaderPair)]
    #[case(Pending::HeaderValue, Flush::HeaderPair)]
    fn boundaries_flush_everything(#[case] pending: Pending, #[case] flush: Flush) {
        assert_eq!(
            on_boundary(pending),
            Decision {
                flush,
                next: Pending::Idle
            }
        );
    }
}
