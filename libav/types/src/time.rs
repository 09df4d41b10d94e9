/*!
    Time bases and timestamps.
*/

use std::fmt;
use std::time::Duration;

/**
    A rational number: the time base of a stream.

    Stream timestamps are integer tick counts; the time base gives the
    duration of one tick (e.g. 1/90000 for MPEG-TS, 1/48000 for 48 kHz
    audio).
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new time base.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/**
    Presentation timestamp in time-base ticks.

    Raw value from the stream; combine with the stream's [`Rational`] time
    base to get wall-clock time.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert to a wall-clock duration using the given time base.

        Negative timestamps clamp to zero.
    */
    pub fn to_duration(self, time_base: Rational) -> Duration {
        if self.0 <= 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.0 as f64 * time_base.to_f64())
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
