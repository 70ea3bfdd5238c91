use bytes::Bytes;

/// Per-frame flag bits.
///
/// `MORE` marks a frame as a non-terminal part of a multipart message.
/// `LABEL` marks a frame as routing/label metadata rather than payload.
/// The two bits are orthogonal; all four combinations are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Further frames belong to the same logical message.
    pub const MORE: Self = Self(0b01);
    /// The frame carries label/routing metadata.
    pub const LABEL: Self = Self(0b10);

    #[inline]
    #[must_use]
    pub const fn more(self) -> bool {
        (self.0 & Self::MORE.0) != 0
    }

    #[inline]
    #[must_use]
    pub const fn label(self) -> bool {
        (self.0 & Self::LABEL.0) != 0
    }

    /// Set or clear the `MORE` bit.
    #[must_use]
    pub const fn with_more(self, more: bool) -> Self {
        if more {
            Self(self.0 | Self::MORE.0)
        } else {
            Self(self.0 & !Self::MORE.0)
        }
    }

    /// Set or clear the `LABEL` bit.
    #[must_use]
    pub const fn with_label(self, label: bool) -> Self {
        if label {
            Self(self.0 | Self::LABEL.0)
        } else {
            Self(self.0 & !Self::LABEL.0)
        }
    }

    /// Combine two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw bit representation.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// The atomic unit of transfer: an uninterpreted byte sequence plus flags.
///
/// A logical message is an ordered sequence of frames where every frame
/// except the last has `more() == true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
    pub flags: FrameFlags,
}

impl Frame {
    /// A frame with no flags set (a complete single-frame message).
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            flags: FrameFlags::NONE,
        }
    }

    /// A frame with an explicit flag set.
    pub fn with_flags(payload: impl Into<Bytes>, flags: FrameFlags) -> Self {
        Self {
            payload: payload.into(),
            flags,
        }
    }

    /// Do further frames of the same logical message follow this one?
    #[inline]
    #[must_use]
    pub const fn more(&self) -> bool {
        self.flags.more()
    }

    /// Is this a label/metadata frame?
    #[inline]
    #[must_use]
    pub const fn is_label(&self) -> bool {
        self.flags.label()
    }
}
