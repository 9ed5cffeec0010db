use core::fmt;

bitflags::bitflags! {
    /// Deficiencies of a rendered frame.
    ///
    /// This type describes the ways in which a frame could fail to accurately show the
    /// scene as it was at that moment. Frames are always produced even when flawed, so that
    /// a single bad ray or job never stops the demo.
    ///
    /// It is a [`bitflags`] generated bit-flag type. *Note: We make no guarantees that
    /// the numeric value of flags will stay the same across versions*; please treat this
    /// as a set of named values only.
    ///
    /// The [empty](Self::empty) set means no flaws are present.
    #[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
    pub struct Flaws: u8 {
        /// Some pixels could not be raytraced (their ray was degenerate) and show the
        /// background instead.
        const FALLBACK_PIXELS = 1 << 0;

        /// A worker failed while tracing a band; that band shows the background.
        const WORKER_FAILURE = 1 << 1;

        /// The camera could not be updated, so the previous frame's image was kept.
        const STALE_FRAME = 1 << 2;
    }
}

impl Default for Flaws {
    /// Equivalent to [`Self::empty()`].
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Flaws {
    /// Displays the flags as text like “`FALLBACK_PIXELS | STALE_FRAME`".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
