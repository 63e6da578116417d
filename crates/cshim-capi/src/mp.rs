use core::{cmp::Ordering, ffi::c_int};

use cshim::Mp;

use crate::args::{self, guard, guard_count};

/// A big integer handle.
pub type CshimMp = Mp;

/// Creates a big integer with the value zero.
///
/// # Safety
///
/// `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mp_init(out: *mut *mut CshimMp) -> c_int {
    guard("cshim_mp_init", || {
        let mp = Mp::new()?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, mp) }
    })
}

/// Releases a big integer. Null is ignored.
///
/// # Safety
///
/// `mp` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mp_destroy(mp: *mut CshimMp) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(mp) };
    0
}

macro_rules! setter {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// - `mp` must be a live handle.
        /// - `input` must be valid for reads of `cap` bytes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            mp: *mut CshimMp,
            input: *const u8,
            cap: usize,
            off: isize,
            len: isize,
        ) -> c_int {
            guard(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let mp = unsafe { args::handle_mut("mp", mp) }?;
                // SAFETY: See the function's safety docs.
                let input = unsafe { args::view(input, cap, off, len) }?;
                Ok(mp.$method(&input)?)
            })
        }
    };
}

setter! {
    /// Sets the value from big-endian bytes.
    cshim_mp_from_bin => from_bin
}

setter! {
    /// Sets the value from hex digits.
    cshim_mp_set_from_hex => set_from_hex
}

setter! {
    /// Sets the value from decimal digits.
    cshim_mp_set_from_dec => set_from_dec
}

macro_rules! length {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// `mp` must be a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(mp: *const CshimMp) -> isize {
            guard_count(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let mp = unsafe { args::handle("mp", mp) }?;
                Ok(mp.$method()?)
            })
        }
    };
}

length! {
    /// Returns the big-endian byte length, or a negative status.
    cshim_mp_byte_len => byte_len
}

length! {
    /// Returns the bit length, or a negative status.
    cshim_mp_bit_len => bit_len
}

length! {
    /// Returns the number of hex digits `cshim_mp_to_hex` writes,
    /// or a negative status.
    cshim_mp_hex_len => hex_len
}

length! {
    /// Returns the number of decimal digits `cshim_mp_to_dec`
    /// writes, or a negative status.
    cshim_mp_dec_len => dec_len
}

macro_rules! writer {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// - `mp` must be a live handle.
        /// - `out` must be valid for writes of `cap` bytes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            mp: *const CshimMp,
            out: *mut u8,
            cap: usize,
            off: isize,
            len: isize,
        ) -> isize {
            guard_count(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let mp = unsafe { args::handle("mp", mp) }?;
                // SAFETY: See the function's safety docs.
                let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
                Ok(mp.$method(&mut out)?)
            })
        }
    };
}

writer! {
    /// Writes upper-case hex digits without a terminator and
    /// returns their count, or a negative status.
    cshim_mp_to_hex => to_hex
}

writer! {
    /// Writes decimal digits without a terminator and returns
    /// their count, or a negative status.
    cshim_mp_to_dec => to_dec
}

writer! {
    /// Writes the big-endian bytes and returns their count, or a
    /// negative status.
    cshim_mp_to_bin => to_bin
}

/// Returns 1 if `a == b`, 0 if not, or a negative status.
///
/// # Safety
///
/// `a` and `b` must be live handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mp_equal(a: *const CshimMp, b: *const CshimMp) -> c_int {
    let mut eq = false;
    let code = guard("cshim_mp_equal", || {
        // SAFETY: See the function's safety docs.
        let (a, b) = unsafe { (args::handle("a", a)?, args::handle("b", b)?) };
        eq = a.equals(b)?;
        Ok(())
    });
    if code == 0 { c_int::from(eq) } else { code }
}

/// Stores -1, 0 or 1 in `result` as `a` is less than, equal to
/// or greater than `b`.
///
/// # Safety
///
/// - `a` and `b` must be live handles.
/// - `result` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mp_cmp(
    result: *mut c_int,
    a: *const CshimMp,
    b: *const CshimMp,
) -> c_int {
    guard("cshim_mp_cmp", || {
        // SAFETY: See the function's safety docs.
        let result = unsafe { args::out("result", result) }?;
        // SAFETY: See the function's safety docs.
        let (a, b) = unsafe { (args::handle("a", a)?, args::handle("b", b)?) };
        *result = match a.compare(b)? {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        Ok(())
    })
}
