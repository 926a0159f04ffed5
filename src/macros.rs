//! Checked integer conversions for values that are in range by construction.
//!
//! With the `unsafe_conversions` feature the check is skipped.

#[macro_export]
macro_rules! u8 {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { u8::try_from($a).unwrap_unchecked() }
        } else {
            u8::try_from($a).unwrap()
        }
    };
}

#[macro_export]
macro_rules! u16 {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { u16::try_from($a).unwrap_unchecked() }
        } else {
            u16::try_from($a).unwrap()
        }
    };
}

#[macro_export]
macro_rules! u32 {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { u32::try_from($a).unwrap_unchecked() }
        } else {
            u32::try_from($a).unwrap()
        }
    };
}

#[macro_export]
macro_rules! i32 {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { i32::try_from($a).unwrap_unchecked() }
        } else {
            i32::try_from($a).unwrap()
        }
    };
}

#[macro_export]
macro_rules! usize {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { usize::try_from($a).unwrap_unchecked() }
        } else {
            usize::try_from($a).unwrap()
        }
    };
}
